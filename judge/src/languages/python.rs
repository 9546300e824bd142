//! The `python` adapter: no compile step, invokes the interpreter directly
//! against a written `source.py`.

use std::time::Duration;

use sandbox::supervisor::{self, SupervisedCommand};
use sandbox::ExecutionRecord;

use super::{restricted_path_env, Adapter, LanguageTag, SandboxDir};

pub struct PythonAdapter;

impl Adapter for PythonAdapter {
    fn tag(&self) -> LanguageTag {
        "python"
    }

    fn run(&self, source: &str, stdin: &[u8], timeout: Duration) -> sandbox::Result<ExecutionRecord> {
        let sandbox_dir = SandboxDir::new().map_err(|e| sandbox::ErrorKind::Spawn("python".into(), e.to_string()))?;
        let source_path = sandbox_dir.path().join("source.py");
        std::fs::write(&source_path, source)
            .map_err(|e| sandbox::ErrorKind::Spawn("python".into(), e.to_string()))?;

        let mut env = restricted_path_env();
        env.push(("PYTHONUNBUFFERED".to_string(), "1".to_string()));
        env.push(("PYTHONDONTWRITEBYTECODE".to_string(), "1".to_string()));
        env.push(("PYTHONNOUSERSITE".to_string(), "1".to_string()));

        supervisor::run(SupervisedCommand {
            program: "python3".to_string(),
            args: vec![source_path.display().to_string()],
            working_dir: sandbox_dir.path().to_path_buf(),
            env,
            stdin: stdin.to_vec(),
            timeout,
            limits: self.resource_limits(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_reports_its_own_tag() {
        assert_eq!(PythonAdapter.tag(), "python");
    }
}
