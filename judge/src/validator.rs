//! Component D: the Static Validator.
//!
//! A best-effort advisory layer, not a security boundary: the Resource
//! Limiter and the sandbox directory still have to hold the line against
//! anything the denylists miss. Rules are data (regex tables keyed by
//! language tag), not code, per the "rules are data" design note.

use once_cell::sync::Lazy;
use regex::Regex;

/// Hard cap on accepted source length, in bytes.
pub const MAX_SOURCE_BYTES: usize = 100 * 1024;

/// Why a submission was rejected before execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    EmptySource,
    SourceTooLarge { actual: usize, limit: usize },
    Denylisted { rule: &'static str },
    NetworkAccess { rule: &'static str },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::EmptySource => write!(f, "source is empty"),
            Rejection::SourceTooLarge { actual, limit } => {
                write!(f, "source is {} bytes, exceeding the {}-byte cap", actual, limit)
            }
            Rejection::Denylisted { rule } => write!(f, "source matches denylisted construct: {}", rule),
            Rejection::NetworkAccess { rule } => write!(f, "source matches denylisted network access: {}", rule),
        }
    }
}

struct Rule {
    name: &'static str,
    pattern: Lazy<Regex>,
}

macro_rules! rule {
    ($name:expr, $pattern:expr) => {
        Rule { name: $name, pattern: Lazy::new(|| Regex::new($pattern).expect("static validator pattern must compile")) }
    };
}

/// Denylisted filesystem-write, process-spawning, reflection, raw-socket,
/// dynamic-compilation, and unsafe-interop constructs, per language.
fn language_rules(language: &str) -> &'static [Rule] {
    static PYTHON: Lazy<Vec<Rule>> = Lazy::new(|| {
        vec![
            rule!("filesystem write", r"\bopen\s*\([^)]*['\"]w"),
            rule!("process spawning", r"\b(os\.system|subprocess\.|os\.popen|os\.exec[lv])"),
            rule!("dynamic code execution", r"\b(eval|exec|compile)\s*\("),
            rule!("reflection / import machinery", r"\b(__import__|importlib)\b"),
            rule!("native library loading", r"\bctypes\b"),
        ]
    });
    static JAVASCRIPT: Lazy<Vec<Rule>> = Lazy::new(|| {
        vec![
            rule!("filesystem write", r"\brequire\(\s*['\"]fs['\"]\s*\)"),
            rule!("process spawning", r"\b(child_process|process\.binding)\b"),
            rule!("dynamic code execution", r"\b(eval|new Function)\s*\("),
            rule!("native addon loading", r"\bprocess\.dlopen\b"),
        ]
    });
    static JAVA: Lazy<Vec<Rule>> = Lazy::new(|| {
        vec![
            rule!("process spawning", r"\bRuntime\.getRuntime\(\)\.exec\b|\bProcessBuilder\b"),
            rule!("reflection bridge", r"\bjava\.lang\.reflect\b|\bClass\.forName\b"),
            rule!("native library loading", r"\bSystem\.(load|loadLibrary)\b"),
            rule!("filesystem write", r"\bnew\s+FileOutputStream\b|\bFiles\.write\b"),
        ]
    });
    static CPP: Lazy<Vec<Rule>> = Lazy::new(|| {
        vec![
            rule!("process spawning", r"\b(system|popen|execve?|execlp?|fork)\s*\("),
            rule!("dynamic library loading", r"\bdlopen\s*\("),
            rule!("filesystem write", r#"fopen\s*\([^)]*"w"#),
            rule!("raw assembly / unsafe interop", r"\basm\s*\("),
        ]
    });
    static CSHARP: Lazy<Vec<Rule>> = Lazy::new(|| {
        vec![
            rule!("process spawning", r"\bSystem\.Diagnostics\.Process\b"),
            rule!("reflection bridge", r"\bSystem\.Reflection\b|\bAssembly\.Load\b"),
            rule!("unsafe interop", r"\bDllImport\b|\bMarshal\.\w+\b"),
            rule!("filesystem write", r"\bFile\.(Write|Create|OpenWrite)\b"),
        ]
    });

    match language {
        "python" => &PYTHON,
        "javascript" => &JAVASCRIPT,
        "java" => &JAVA,
        "cpp" => &CPP,
        "csharp" => &CSHARP,
        _ => &[],
    }
}

/// Patterns matching known HTTP/socket APIs, checked across all languages
/// regardless of tag.
static NETWORK_RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule!("raw socket API", r"\b(socket\.socket|import socket|net\.Socket|java\.net\.Socket|System\.Net\.Sockets)\b"),
        rule!("HTTP client API", r"\b(urllib\.request|requests\.(get|post)|http\.client|fetch\(|XMLHttpRequest|HttpClient|curl_exec)\b"),
        rule!("raw network includes", r"#include\s*<(sys/socket|netinet/in|arpa/inet)\.h>"),
    ]
});

/// Validate `source` for `language`, applying rejection rules in order:
/// empty → size cap → language denylist → network denylist.
pub fn validate(source: &str, language: &str) -> Result<(), Rejection> {
    if source.is_empty() {
        return Err(Rejection::EmptySource);
    }
    if source.len() > MAX_SOURCE_BYTES {
        return Err(Rejection::SourceTooLarge { actual: source.len(), limit: MAX_SOURCE_BYTES });
    }

    #[cfg(feature = "python-ast")]
    if language == "python" {
        if let Some(rejection) = python_ast::check(source) {
            return Err(rejection);
        }
    }

    for rule in language_rules(language) {
        if rule.pattern.is_match(source) {
            return Err(Rejection::Denylisted { rule: rule.name });
        }
    }
    for rule in NETWORK_RULES.iter() {
        if rule.pattern.is_match(source) {
            return Err(Rejection::NetworkAccess { rule: rule.name });
        }
    }
    Ok(())
}

/// Optional structural pre-pass for Python: parses the source and raises a
/// rejection from the AST when the parser is available and succeeds. A
/// parse failure falls through to the regex denylist above, rather than
/// being treated as a syntax-error rejection itself — that classification
/// belongs to the orchestrator once the program actually runs.
#[cfg(feature = "python-ast")]
mod python_ast {
    use super::Rejection;
    use rustpython_parser::{ast, Parse};

    pub fn check(source: &str) -> Option<Rejection> {
        let module = ast::Suite::parse(source, "<submission>").ok()?;
        for stmt in module {
            if references_import(&stmt) {
                return Some(Rejection::Denylisted { rule: "AST: import statement" });
            }
        }
        None
    }

    fn references_import(stmt: &ast::Stmt) -> bool {
        matches!(stmt, ast::Stmt::Import(_) | ast::Stmt::ImportFrom(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_rejected() {
        assert_eq!(validate("", "python"), Err(Rejection::EmptySource));
    }

    #[test]
    fn source_at_exactly_the_cap_is_accepted() {
        let source = "x".repeat(MAX_SOURCE_BYTES);
        assert_eq!(validate(&source, "unknown"), Ok(()));
    }

    #[test]
    fn source_one_byte_over_the_cap_is_rejected() {
        let source = "x".repeat(MAX_SOURCE_BYTES + 1);
        assert!(matches!(validate(&source, "unknown"), Err(Rejection::SourceTooLarge { .. })));
    }

    #[test]
    fn python_os_system_is_denylisted() {
        let source = "import os\nos.system('rm -rf /')\n";
        assert!(matches!(validate(source, "python"), Err(Rejection::Denylisted { .. })));
    }

    #[test]
    fn cpp_socket_include_is_network_denylisted() {
        let source = "#include <sys/socket.h>\nint main(){return 0;}\n";
        assert!(matches!(validate(source, "cpp"), Err(Rejection::NetworkAccess { .. })));
    }

    #[test]
    fn benign_python_program_is_accepted() {
        assert_eq!(validate("print(int(input())+int(input()))", "python"), Ok(()));
    }
}
