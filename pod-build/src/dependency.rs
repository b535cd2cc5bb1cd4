use std::path::PathBuf;

/// Group identifier of the runtime-supplied baseline artifacts.
pub const BASELINE_GROUP: &str = "org.reedlang";

/// Artifacts supplied by the runtime bootstrap rather than the
/// classpath: the core runtime, its tool support library, the compiler,
/// and the umbrella package descriptor.
pub const BASELINE_ARTIFACTS: &[&str] = &["reed-base", "reed-tools", "reed-compiler", "reed-all"];

/// Classifier marking a dependency that must be consulted before
/// non-patch entries of the same artifact.
pub const PATCH_CLASSIFIER: &str = "patch";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyKind {
    /// A pod archive, eligible for classpaths and packing.
    Pod,
    /// Anything else; ignored by the resolver and the assembler.
    Other(String),
}

/// A resolved dependency as handed over by the host build tool.
/// Consumed read-only; this crate never mutates descriptors.
#[derive(Debug, Clone)]
pub struct Dependency {
    pub group: String,
    pub artifact: String,
    pub classifier: Option<String>,
    pub file: PathBuf,
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn pod(
        group: impl Into<String>,
        artifact: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Dependency {
        Dependency {
            group: group.into(),
            artifact: artifact.into(),
            classifier: None,
            file: file.into(),
            kind: DependencyKind::Pod,
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Dependency {
        self.classifier = Some(classifier.into());
        self
    }

    pub fn is_pod(&self) -> bool {
        self.kind == DependencyKind::Pod
    }

    pub fn is_patch(&self) -> bool {
        self.classifier.as_deref() == Some(PATCH_CLASSIFIER)
    }

    pub fn is_baseline(&self) -> bool {
        self.group == BASELINE_GROUP && BASELINE_ARTIFACTS.contains(&self.artifact.as_str())
    }

    /// `group:artifact` form used in log and error messages.
    pub fn id(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }
}
