use rstest::rstest;
use weigh_config::{Driver, Method, RunMode, load_toml};

#[rstest]
#[case("[capture]\npoll_interval_ms = 0\n", "capture.poll_interval_ms must be >= 1")]
#[case("[capture]\nwindow_capacity = 0\nmin_samples = 2\n", "capture.window_capacity must be >= 1")]
#[case("[capture]\nmin_samples = 1\n", "capture.min_samples must be >= 3")]
#[case("[capture]\nmin_samples = 2\n", "capture.min_samples must be >= 3")]
#[case("[capture]\nwindow_capacity = 3\nmin_samples = 4\n", "min_samples must be <= capture.window_capacity")]
#[case("[capture]\nstability_threshold = 0.0\n", "stability_threshold must be finite and > 0.0")]
#[case("[capture]\nstability_threshold = -5.0\n", "stability_threshold must be finite and > 0.0")]
#[case("[timeouts]\nsource_ms = 0\n", "timeouts.source_ms must be >= 1")]
#[case("[vehicle]\naxle_count = 0\n", "vehicle.axle_count must be >= 1")]
#[case(
    "[vehicle]\naxle_count = 2\naxle_types = [\"steering\", \"drive\", \"drive\"]\n",
    "vehicle.axle_types must not list more entries"
)]
#[case("[vehicle]\nmax_gross = 0.0\n", "vehicle.max_gross must be finite and > 0.0")]
#[case("[source]\ndriver = \"http\"\ndevice_id = \"s1\"\n", "source.base_url must be set")]
#[case(
    "[source]\ndriver = \"http\"\nbase_url = \"ftp://x\"\ndevice_id = \"s1\"\n",
    "must start with http://"
)]
#[case("[source]\ndriver = \"http\"\nbase_url = \"http://gw\"\n", "source.device_id must be set")]
#[case("[source]\nsim_jitter = -1.0\n", "source.sim_jitter must be finite")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
fn rejects_invalid(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    let msg = format!("{err}");
    assert!(msg.contains(needle), "message {msg:?} should contain {needle:?}");
}

#[test]
fn accepts_full_config() {
    let toml = r#"
[source]
method = "iot"
driver = "http"
device_id = "bridge-scale-1"
base_url = "http://10.0.0.12:8080"

[capture]
poll_interval_ms = 500
window_capacity = 6
min_samples = 4
stability_threshold = 10.0
auto_capture = false
max_consecutive_failures = 10
max_wait_ms = 120000

[timeouts]
source_ms = 400

[vehicle]
id = "TRK-001"
axle_count = 3
name = "Volvo FH 6x4"
type = "tractor"
axle_types = ["steering", "drive", "drive"]
max_gross = 26000.0

[logging]
level = "debug"
rotation = "daily"

[runner]
mode = "direct"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.source.method, Method::Iot);
    assert_eq!(cfg.source.driver, Driver::Http);
    assert_eq!(cfg.capture.min_samples, 4);
    assert!(!cfg.capture.auto_capture);
    assert_eq!(cfg.runner.mode, RunMode::Direct);
    let v = cfg.vehicle.expect("vehicle section");
    assert_eq!(v.kind, "tractor");
    assert_eq!(v.to_axle_configuration().axle_types.len(), 3);
}

#[test]
fn manual_method_needs_no_gateway() {
    let cfg = load_toml("[source]\nmethod = \"manual\"\ndriver = \"http\"\n").expect("parse TOML");
    cfg.validate().expect("manual entry ignores the http driver");
}

#[test]
fn poll_ms_alias_is_accepted() {
    let cfg = load_toml("[timeouts]\npoll_ms = 250\n").expect("parse TOML");
    assert_eq!(cfg.timeouts.source_ms, 250);
}

#[test]
fn unknown_method_fails_to_parse() {
    assert!(load_toml("[source]\nmethod = \"carrier-pigeon\"\n").is_err());
}

#[test]
fn shipped_sample_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../etc/weigh_config.toml");
    let text = std::fs::read_to_string(path).expect("read sample config");
    let cfg = load_toml(&text).expect("parse sample");
    cfg.validate().expect("sample validates");
    assert_eq!(cfg.vehicle.expect("vehicle section").axle_count, 5);
}
