//! The `csharp` adapter: uses the modern `dotnet` toolchain when present
//! (scaffolds a console project, builds it, runs the resulting assembly),
//! falling back to the legacy Mono compiler (`mcs` + `mono`) otherwise. A
//! compile failure short-circuits per `spec.md` §4.C.

use std::process::Stdio;
use std::time::Duration;

use sandbox::supervisor::SupervisedCommand;
use sandbox::{ExecutionRecord, ResourceLimits};

use super::{compile_then_run, restricted_path_env, Adapter, LanguageTag, SandboxDir};

pub struct CSharpAdapter;

impl Adapter for CSharpAdapter {
    fn tag(&self) -> LanguageTag {
        "csharp"
    }

    fn run(&self, source: &str, stdin: &[u8], timeout: Duration) -> sandbox::Result<ExecutionRecord> {
        let sandbox_dir = SandboxDir::new().map_err(|e| sandbox::ErrorKind::Spawn("csharp".into(), e.to_string()))?;
        let env = restricted_path_env();
        let limits = self.resource_limits();

        if dotnet_available() {
            run_modern(sandbox_dir, source, stdin, timeout, env, limits)
        } else {
            run_legacy(sandbox_dir, source, stdin, timeout, env, limits)
        }
    }
}

impl CSharpAdapter {
    fn resource_limits(&self) -> ResourceLimits {
        // Both the CoreCLR and Mono runtimes map well more address space
        // than a trivial `Program.cs` ever allocates (JIT code heaps, the
        // GC's reserved segments); the default 256 MiB cap needs raising
        // for either toolchain to even start up.
        ResourceLimits {
            address_space_bytes: sandbox::limiter::RAISED_ADDRESS_SPACE_BYTES,
            ..ResourceLimits::default()
        }
    }
}

/// Scaffolding a project template and probing for a toolchain are both
/// fixed, argument-less-of-user-input operations; neither runs submitted
/// code, so neither goes through the Resource Limiter or Process
/// Supervisor — only the eventual build and run of the user's program do.
fn dotnet_available() -> bool {
    std::process::Command::new("which")
        .arg("dotnet")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

fn run_modern(
    sandbox_dir: super::SandboxDir,
    source: &str,
    stdin: &[u8],
    timeout: Duration,
    env: Vec<(String, String)>,
    limits: ResourceLimits,
) -> sandbox::Result<ExecutionRecord> {
    let project_dir = sandbox_dir.path().join("Solution");
    let scaffold = std::process::Command::new("dotnet")
        .args(["new", "console", "-n", "Solution", "--force"])
        .current_dir(sandbox_dir.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    if scaffold.map(|s| s.success()).unwrap_or(false) {
        let program_path = project_dir.join("Program.cs");
        std::fs::write(&program_path, source)
            .map_err(|e| sandbox::ErrorKind::Spawn("csharp".into(), e.to_string()))?;

        let out_dir = project_dir.join("out");
        let compile = SupervisedCommand {
            program: "dotnet".to_string(),
            args: vec![
                "build".to_string(),
                "-c".to_string(),
                "Release".to_string(),
                "-o".to_string(),
                out_dir.display().to_string(),
                "--nologo".to_string(),
            ],
            working_dir: project_dir.clone(),
            env: env.clone(),
            stdin: Vec::new(),
            timeout,
            limits,
        };

        let dll_path = out_dir.join("Solution.dll");
        let stdin = stdin.to_vec();
        return compile_then_run(
            compile,
            move |remaining| SupervisedCommand {
                program: "dotnet".to_string(),
                args: vec![dll_path.display().to_string()],
                working_dir: project_dir,
                env,
                stdin,
                timeout: remaining,
                limits,
            },
            timeout,
        );
    }

    run_legacy(sandbox_dir, source, stdin, timeout, env, limits)
}

fn run_legacy(
    sandbox_dir: super::SandboxDir,
    source: &str,
    stdin: &[u8],
    timeout: Duration,
    env: Vec<(String, String)>,
    limits: ResourceLimits,
) -> sandbox::Result<ExecutionRecord> {
    let source_path = sandbox_dir.path().join("program.cs");
    std::fs::write(&source_path, source)
        .map_err(|e| sandbox::ErrorKind::Spawn("csharp".into(), e.to_string()))?;

    let assembly_path = sandbox_dir.path().join("program.exe");
    let dir_path = sandbox_dir.path().to_path_buf();
    let compile = SupervisedCommand {
        program: "mcs".to_string(),
        args: vec![format!("-out:{}", assembly_path.display()), source_path.display().to_string()],
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
            program: "mono".to_string(),
            args: vec![assembly_path.display().to_string()],
            working_dir: dir_path,
            env,
            stdin,
            timeout: remaining,
            limits,
        },
        timeout,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_reports_its_own_tag() {
        assert_eq!(CSharpAdapter.tag(), "csharp");
    }

    #[test]
    fn adapter_raises_address_space_cap_for_the_runtime() {
        assert_eq!(CSharpAdapter.resource_limits().address_space_bytes, sandbox::limiter::RAISED_ADDRESS_SPACE_BYTES);
    }
}
