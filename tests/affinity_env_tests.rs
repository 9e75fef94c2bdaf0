//! Environment overrides for affinity processing.
//!
//! The variables are process-wide, so every case runs inside one test in
//! its own test binary.

use std::env;
use std::path::PathBuf;

use gpp_monitor::affinity::{
    StaticTopology, CGROUP_ROOT_ENV, CPUSET_ROOT_ENV, DEFAULT_CGROUP_ROOT, DEFAULT_CPUSET_ROOT,
    DISABLE_AFFINITY_ENV,
};
use gpp_monitor::{AffinityConfig, AffinityDirective, AffinityResolver, MemoryFileSource};

fn resolver() -> AffinityResolver<MemoryFileSource, StaticTopology> {
    AffinityResolver::new(
        AffinityConfig::default(),
        MemoryFileSource::new(),
        StaticTopology::new(vec![(0, vec![0, 1])]),
    )
}

#[test]
fn test_environment_overrides() {
    env::remove_var(DISABLE_AFFINITY_ENV);
    env::remove_var(CPUSET_ROOT_ENV);
    env::remove_var(CGROUP_ROOT_ENV);

    let config = AffinityConfig::default();
    assert!(!config.is_disabled());
    assert_eq!(config.cpuset_root(), PathBuf::from(DEFAULT_CPUSET_ROOT));
    assert_eq!(config.cgroup_root(), PathBuf::from(DEFAULT_CGROUP_ROOT));

    // Any value disables, even an empty one
    env::set_var(DISABLE_AFFINITY_ENV, "");
    let r = resolver();
    assert!(r.is_disabled());
    r.set_affinity_directives(&[AffinityDirective::new("cpu", "0")], 1, &[])
        .unwrap();
    assert!(r.topology().applied().is_empty());
    env::remove_var(DISABLE_AFFINITY_ENV);
    assert!(!resolver().is_disabled());

    // Roots come from the environment when the config leaves them unset
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::create_dir(root.path().join("rt")).expect("Failed to create cgroup dir");
    env::set_var(CPUSET_ROOT_ENV, "/tmp/cpuset-root");
    env::set_var(CGROUP_ROOT_ENV, root.path());

    let config = AffinityConfig::default();
    assert_eq!(config.cpuset_root(), PathBuf::from("/tmp/cpuset-root"));
    assert_eq!(config.cgroup_root(), root.path().to_path_buf());

    resolver()
        .set_affinity_directives(&[AffinityDirective::new("cgroup", "rt")], 777, &[])
        .unwrap();
    let task = std::fs::read_to_string(root.path().join("rt").join("task")).unwrap();
    assert_eq!(task.trim(), "777");

    // An explicit config value wins over the environment
    let config = AffinityConfig {
        cpuset_root: Some(PathBuf::from("/srv/cpuset")),
        ..AffinityConfig::default()
    };
    assert_eq!(config.cpuset_root(), PathBuf::from("/srv/cpuset"));

    env::remove_var(CPUSET_ROOT_ENV);
    env::remove_var(CGROUP_ROOT_ENV);
}
