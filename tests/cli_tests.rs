//! CLI integration tests
//!
//! Scheduler commands are replaced by small shell scripts, so no cluster is
//! needed.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the schedcache binary
fn schedcache() -> Command {
    Command::cargo_bin("schedcache").unwrap()
}

#[test]
fn test_help() {
    schedcache()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Snapshot cache for single-job bjobs and bhist lookups",
        ));
}

#[test]
fn test_version() {
    schedcache()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("schedcache"));
}

#[test]
fn test_cache_help() {
    schedcache()
        .args(["cache", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("refresh"))
        .stdout(predicate::str::contains("clear"));
}

#[test]
fn test_watch_help() {
    schedcache()
        .args(["watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--until"))
        .stdout(predicate::str::contains("--while"))
        .stdout(predicate::str::contains("--interval"))
        .stdout(predicate::str::contains("--exec"))
        .stdout(predicate::str::contains("--notify"));
}

#[test]
fn test_config_help() {
    schedcache()
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Manage configuration"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("path"));
}

#[test]
fn test_completions_bash() {
    schedcache()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("schedcache"));
}

#[test]
fn test_invalid_command() {
    schedcache().arg("invalid-command").assert().failure();
}

#[test]
fn test_invalid_output_format() {
    schedcache()
        .args(["--output", "invalid", "cache", "status"])
        .assert()
        .failure();
}

#[cfg(unix)]
mod emulation {
    use super::*;
    use std::fs;
    use std::os::unix::fs::{symlink, PermissionsExt};
    use std::path::{Path, PathBuf};

    use schedcache::config::current_user;

    const LISTING: &str = "\
JOBID   USER    STAT  QUEUE      FROM_HOST   EXEC_HOST   JOB_NAME   SUBMIT_TIME
13622473 usatlas EXIT  grid       ce01        wn042       pilot      Mar 14 09:12
13622480 usatlas RUN   grid       ce01        wn017       pilot      Mar 14 09:15
";

    const HISTORY: &str = "\
Summary of time in seconds spent in various states:
JOBID   USER    JOB_NAME  PEND    PSUSP   RUN     USUSP   SSUSP   UNKWN   TOTAL
13622473 usatlas pilot    12      0       3400    0       0       0       3412
13622480 usatlas pilot    9       0       120     0       0       0       129

";

    /// Scratch cache directory plus fake scheduler commands
    struct Cluster {
        dir: TempDir,
    }

    impl Cluster {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir(dir.path().join("bin")).unwrap();
            let cluster = Self { dir };
            cluster.script("bjobs", LISTING);
            cluster.script("bhist", HISTORY);
            cluster
        }

        /// Write a fake command: `-a` prints `listing`, anything else echoes
        /// its arguments and exits 3
        fn script(&self, name: &str, listing: &str) {
            let path = self.bin(name);
            let body = format!(
                "#!/bin/sh\n\
                 if [ \"$1\" = \"-a\" ]; then\n\
                 cat <<'EOF'\n{}EOF\n\
                 exit 0\n\
                 fi\n\
                 echo \"real {} $*\"\n\
                 exit 3\n",
                listing, name
            );
            fs::write(&path, body).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn bin(&self, name: &str) -> PathBuf {
            self.dir.path().join("bin").join(name)
        }

        fn cache_dir(&self) -> PathBuf {
            self.dir.path().join("cache")
        }

        fn configure(&self, cmd: &mut Command) {
            cmd.env("SCHEDCACHE_CONFIG", self.dir.path().join("config.toml"))
                .env("SCHEDCACHE_DIR", self.cache_dir())
                .env("SCHEDCACHE_BJOBS", self.bin("bjobs"))
                .env("SCHEDCACHE_BHIST", self.bin("bhist"))
                .env("SCHEDCACHE_LIFETIME", "600")
                .env_remove("SCHEDCACHE_MAINTAIN")
                .env_remove("SCHEDCACHE_EXTRA_ARGS")
                .env_remove("SCHEDCACHE_DEBUG")
                .env_remove("SCHEDCACHE_LOG");
        }

        fn admin(&self) -> Command {
            let mut cmd = schedcache();
            self.configure(&mut cmd);
            cmd
        }

        /// The binary reached through a symlink called `name`
        fn linked(&self, name: &str) -> Command {
            let link = self.dir.path().join(name);
            if !link.exists() {
                symlink(assert_cmd::cargo::cargo_bin("schedcache"), &link).unwrap();
            }
            let mut cmd = Command::new(&link);
            self.configure(&mut cmd);
            cmd
        }

        fn snapshot(&self, command: &str) -> PathBuf {
            self.cache_dir()
                .join(format!("schedcache-{}-{}.snapshot", current_user(), command))
        }
    }

    fn exists(path: &Path) -> bool {
        path.metadata().is_ok()
    }

    #[test]
    fn test_query_listing_hit() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["query", "bjobs", "13622480"])
            .assert()
            .code(0)
            .stdout(
                "JOBID   USER    STAT  QUEUE      FROM_HOST   EXEC_HOST   JOB_NAME   SUBMIT_TIME\n\
                 13622480 usatlas RUN   grid       ce01        wn017       pilot      Mar 14 09:15\n",
            )
            .stderr("");

        assert!(exists(&cluster.snapshot("bjobs")));
    }

    #[test]
    fn test_query_history_hit_ends_with_blank_line() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["query", "bhist", "13622473"])
            .assert()
            .code(0)
            .stdout(predicate::str::starts_with(
                "Summary of time in seconds spent in various states:\n",
            ))
            .stdout(predicate::str::contains("13622473 usatlas pilot"))
            .stdout(predicate::str::ends_with("3412\n\n"));
    }

    #[test]
    fn test_listing_not_found() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["query", "bjobs", "5"])
            .assert()
            .code(0)
            .stdout("")
            .stderr("Job <5> is not found\n");
    }

    #[test]
    fn test_history_not_found() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["query", "bhist", "5"])
            .assert()
            .code(255)
            .stdout("No matching job found\n");
    }

    #[test]
    fn test_overflow_still_missing_is_not_found() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["query", "bjobs", "99999999"])
            .assert()
            .code(0)
            .stdout("")
            .stderr("Job <99999999> is not found\n");
    }

    #[test]
    fn test_unsupported_arguments_fall_back() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["query", "bjobs", "-w", "13622480"])
            .assert()
            .code(3)
            .stdout("real bjobs -w 13622480\n");

        // Nothing was cached for a query the cache can't answer
        assert!(!exists(&cluster.snapshot("bjobs")));
    }

    #[test]
    fn test_maintain_off_falls_back() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .env("SCHEDCACHE_MAINTAIN", "false")
            .args(["query", "bjobs", "13622480"])
            .assert()
            .code(3)
            .stdout("real bjobs 13622480\n");
    }

    #[test]
    fn test_symlink_invocation() {
        let cluster = Cluster::new();
        cluster
            .linked("bjobs")
            .arg("13622473")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("13622473 usatlas EXIT"));

        cluster
            .linked("bhist")
            .arg("5")
            .assert()
            .code(255)
            .stdout("No matching job found\n");
    }

    #[test]
    fn test_unknown_invocation_name() {
        let cluster = Cluster::new();
        cluster
            .linked("qstat")
            .arg("1")
            .assert()
            .code(64)
            .stderr(predicate::str::contains("qstat"));
    }

    #[test]
    fn test_snapshot_reused_between_runs() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["query", "bjobs", "13622480"])
            .assert()
            .success();

        // Break the real command; the fresh snapshot still answers
        fs::write(cluster.bin("bjobs"), "#!/bin/sh\nexit 9\n").unwrap();

        cluster
            .admin()
            .args(["query", "bjobs", "13622473"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("13622473 usatlas EXIT"));
    }

    #[test]
    fn test_cache_status_and_clear() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["cache", "refresh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("bjobs refreshed"))
            .stdout(predicate::str::contains("bhist refreshed"));

        cluster
            .admin()
            .args(["--output", "json", "cache", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"max_job_id\": 13622480"))
            .stdout(predicate::str::contains("\"fresh\": true"));

        cluster
            .admin()
            .args(["cache", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 snapshots removed"));

        assert!(!exists(&cluster.snapshot("bjobs")));
        assert!(!exists(&cluster.snapshot("bhist")));
    }

    #[test]
    fn test_config_path_and_set() {
        let cluster = Cluster::new();
        let config_file = cluster.dir.path().join("config.toml");

        cluster
            .admin()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(config_file.display().to_string()))
            .stdout(predicate::str::contains("Exists: no"));

        cluster
            .admin()
            .args(["config", "set", "cache.lifetime_secs", "120"])
            .assert()
            .success();

        let written = fs::read_to_string(&config_file).unwrap();
        assert!(written.contains("lifetime_secs = 120"));
        // Environment overrides are not written back
        assert!(!written.contains("bin/bjobs"));

        cluster
            .admin()
            .args(["config", "set", "cache.nope", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn test_watch_returns_when_state_reached() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["watch", "13622473", "--until", "EXIT,DONE", "--interval", "1s"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Job 13622473 is EXIT"));
    }

    #[test]
    fn test_watch_runs_exec_hook() {
        let cluster = Cluster::new();
        let marker = cluster.dir.path().join("fired");
        cluster
            .admin()
            .args(["watch", "13622480", "--until", "RUN", "--exec"])
            .arg(format!("echo \"$JOB_ID $JOB_STAT\" > {}", marker.display()))
            .assert()
            .success();

        assert_eq!(fs::read_to_string(&marker).unwrap(), "13622480 RUN\n");
    }

    #[test]
    fn test_watch_missing_job_fails() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["watch", "5", "--interval", "1s"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Job 5 is no longer listed"));
    }

    #[test]
    fn test_watch_while_job_gone_fires() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .args(["watch", "5", "--until", "RUN", "--while", "--interval", "1s"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Job 5 is GONE"));
    }

    #[test]
    fn test_emulation_without_home() {
        let cluster = Cluster::new();
        let link = cluster.dir.path().join("bjobs");
        symlink(assert_cmd::cargo::cargo_bin("schedcache"), &link).unwrap();

        Command::new(&link)
            .env_clear()
            .env("PATH", "/usr/bin:/bin")
            .env("SCHEDCACHE_DIR", cluster.cache_dir())
            .env("SCHEDCACHE_BJOBS", cluster.bin("bjobs"))
            .arg("13622480")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("13622480 usatlas RUN"));

        assert!(exists(&cluster.snapshot("bjobs")));
    }

    #[test]
    fn test_user_variable_does_not_change_identity() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .env("USER", "someone_else")
            .env("LOGNAME", "someone_else")
            .args(["query", "bjobs", "13622480"])
            .assert()
            .success();

        assert!(exists(&cluster.snapshot("bjobs")));
        assert!(!exists(
            &cluster
                .cache_dir()
                .join("schedcache-someone_else-bjobs.snapshot")
        ));
    }

    #[test]
    fn test_debug_log_is_plain_when_redirected() {
        let cluster = Cluster::new();
        cluster
            .admin()
            .env("SCHEDCACHE_DEBUG", "true")
            .args(["query", "bjobs", "13622480"])
            .assert()
            .code(0)
            .stderr(predicate::str::contains("bjobs 13622480: hit"))
            .stderr(predicate::str::contains("\u{1b}[").not());
    }
}
