//! The `cpp` adapter: compiles `main.cpp` to a `main` binary, then runs it.
//! A compile failure short-circuits per `spec.md` §4.C.

use std::time::Duration;

use sandbox::supervisor::SupervisedCommand;
use sandbox::ExecutionRecord;

use super::{compile_then_run, restricted_path_env, Adapter, LanguageTag, SandboxDir};

pub struct CppAdapter;

impl Adapter for CppAdapter {
    fn tag(&self) -> LanguageTag {
        "cpp"
    }

    fn run(&self, source: &str, stdin: &[u8], timeout: Duration) -> sandbox::Result<ExecutionRecord> {
        let sandbox_dir = SandboxDir::new().map_err(|e| sandbox::ErrorKind::Spawn("cpp".into(), e.to_string()))?;
        let source_path = sandbox_dir.path().join("main.cpp");
        std::fs::write(&source_path, source)
            .map_err(|e| sandbox::ErrorKind::Spawn("cpp".into(), e.to_string()))?;

        let binary_path = sandbox_dir.path().join("main");
        let dir_path = sandbox_dir.path().to_path_buf();
        let env = restricted_path_env();
        let limits = self.resource_limits();

        let compile = SupervisedCommand {
            program: "g++".to_string(),
            args: vec![
                "-O2".to_string(),
                "-o".to_string(),
                binary_path.display().to_string(),
                source_path.display().to_string(),
            ],
            working_dir: dir_path.clone(),
            env: env.clone(),
            stdin: Vec::new(),
            timeout,
            limits,
        };

        let stdin = stdin.to_vec();
        compile_then_run(
            compile,
            move |remaining| SupervisedCommand {
                program: binary_path.display().to_string(),
                args: Vec::new(),
                working_dir: dir_path.clone(),
                env: env.clone(),
                stdin,
                timeout: remaining,
                limits,
            },
            timeout,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_reports_its_own_tag() {
        assert_eq!(CppAdapter.tag(), "cpp");
    }
}
