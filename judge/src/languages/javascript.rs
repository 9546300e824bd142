//! The `javascript` adapter: no compile step, runs `main.js` under `node`
//! with a capped heap.

use std::time::Duration;

use sandbox::supervisor::{self, SupervisedCommand};
use sandbox::{ExecutionRecord, ResourceLimits};

use super::{restricted_path_env, Adapter, LanguageTag, SandboxDir};

/// `node --max-old-space-size` cap, in MiB, per `spec.md` §4.C.
const MAX_OLD_SPACE_SIZE_MB: u32 = 64;

pub struct JavaScriptAdapter;

impl Adapter for JavaScriptAdapter {
    fn tag(&self) -> LanguageTag {
        "javascript"
    }

    fn run(&self, source: &str, stdin: &[u8], timeout: Duration) -> sandbox::Result<ExecutionRecord> {
        let sandbox_dir = SandboxDir::new().map_err(|e| sandbox::ErrorKind::Spawn("javascript".into(), e.to_string()))?;
        let source_path = sandbox_dir.path().join("main.js");
        std::fs::write(&source_path, source)
            .map_err(|e| sandbox::ErrorKind::Spawn("javascript".into(), e.to_string()))?;

        // `env_clear` already happens inside the supervisor; we only ever
        // hand it the variables we want present, so there is no `NODE_*` to
        // scrub beyond never adding it back.
        let mut env = restricted_path_env();
        env.push(("NODE_ENV".to_string(), "production".to_string()));

        supervisor::run(SupervisedCommand {
            program: "node".to_string(),
            args: vec![
                format!("--max-old-space-size={}", MAX_OLD_SPACE_SIZE_MB),
                source_path.display().to_string(),
            ],
            working_dir: sandbox_dir.path().to_path_buf(),
            env,
            stdin: stdin.to_vec(),
            timeout,
            limits: ResourceLimits::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_reports_its_own_tag() {
        assert_eq!(JavaScriptAdapter.tag(), "javascript");
    }
}
