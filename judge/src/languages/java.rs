//! The `java` adapter: compiles `Main.java` with small-footprint compiler
//! flags, then runs `Main` with a capped heap, serial GC, and tier-1
//! compilation. A compile failure short-circuits per `spec.md` §4.C.

use std::time::Duration;

use sandbox::supervisor::SupervisedCommand;
use sandbox::{ExecutionRecord, ResourceLimits};

use super::{compile_then_run, restricted_path_env, Adapter, LanguageTag, SandboxDir};

pub struct JavaAdapter;

impl Adapter for JavaAdapter {
    fn tag(&self) -> LanguageTag {
        "java"
    }

    fn resource_limits(&self) -> ResourceLimits {
        // The JVM's GC and JIT spin up a handful of native threads even for
        // a trivial `Main`; the default process cap of 10 starves it. The
        // JVM also reserves address space well beyond the `-Xmx` heap cap
        // (thread stacks, the code cache, metaspace, memory-mapped jars),
        // so the default 256 MiB `RLIMIT_AS` is raised too.
        ResourceLimits {
            max_processes: sandbox::limiter::RAISED_MAX_PROCESSES,
            address_space_bytes: sandbox::limiter::RAISED_ADDRESS_SPACE_BYTES,
            ..ResourceLimits::default()
        }
    }

    fn run(&self, source: &str, stdin: &[u8], timeout: Duration) -> sandbox::Result<ExecutionRecord> {
        let sandbox_dir = SandboxDir::new().map_err(|e| sandbox::ErrorKind::Spawn("java".into(), e.to_string()))?;
        let source_path = sandbox_dir.path().join("Main.java");
        std::fs::write(&source_path, source)
            .map_err(|e| sandbox::ErrorKind::Spawn("java".into(), e.to_string()))?;

        let dir_path = sandbox_dir.path().to_path_buf();
        // `JAVA_TOOL_OPTIONS`/`_JAVA_OPTIONS` are deliberately absent from
        // `env` below, never scrubbed from a copied parent environment: the
        // supervisor starts every child from an empty environment, so
        // omission *is* the scrub.
        let env = restricted_path_env();
        let limits = self.resource_limits();

        let compile = SupervisedCommand {
            program: "javac".to_string(),
            args: vec![
                "-J-Xmx32m".to_string(),
                "-J-XX:ReservedCodeCacheSize=8m".to_string(),
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
                program: "java".to_string(),
                args: vec![
                    "-Xmx32m".to_string(),
                    "-Xms16m".to_string(),
                    "-XX:+UseSerialGC".to_string(),
                    "-XX:TieredStopAtLevel=1".to_string(),
                    "-XX:ReservedCodeCacheSize=8m".to_string(),
                    "-XX:MaxMetaspaceSize=16m".to_string(),
                    "-cp".to_string(),
                    dir_path.display().to_string(),
                    "Main".to_string(),
                ],
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
        assert_eq!(JavaAdapter.tag(), "java");
    }

    #[test]
    fn adapter_raises_process_cap_for_the_jvm() {
        assert_eq!(JavaAdapter.resource_limits().max_processes, sandbox::limiter::RAISED_MAX_PROCESSES);
    }

    #[test]
    fn adapter_raises_address_space_cap_for_the_jvm() {
        assert_eq!(JavaAdapter.resource_limits().address_space_bytes, sandbox::limiter::RAISED_ADDRESS_SPACE_BYTES);
    }
}
