//! This crate implements the core logic of the judge: the data model shared
//! by every request shape, static source validation, per-language adapters,
//! and verdict classification.

#[macro_use]
extern crate error_chain;
extern crate log;
extern crate sandbox;

pub mod languages;
pub mod model;
pub mod validator;
pub mod verdict;

error_chain! {
    links {
        Sandbox(sandbox::Error, sandbox::ErrorKind);
    }

    errors {
        /// The submitted language tag is not in the closed adapter set.
        UnknownLanguage(tag: String) {
            description("unknown language tag")
            display("unknown language tag: '{}'", tag)
        }

        /// A test case referenced a file outside the whitelisted prefix set.
        DisallowedFileReference(path: String) {
            description("file reference outside whitelisted prefix")
            display("file reference outside whitelisted prefix: '{}'", path)
        }

        /// A referenced input/expected-output file could not be read.
        FileReferenceUnreadable(path: String, reason: String) {
            description("could not read referenced file")
            display("could not read referenced file '{}': {}", path, reason)
        }
    }
}

pub use languages::{Adapter, LanguageTag};
pub use model::{
    PersistenceRecord, ResponseBundle, Submission, Summary, TestCase, Verdict, VerdictStatus,
};
