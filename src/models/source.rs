use std::path::PathBuf;

/// A mounted disk image. Released exactly once, by the orchestrator's teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountHandle {
    pub image_path: PathBuf,
    /// Drive root assigned to the volume, if the platform exposed one.
    pub root: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSource {
    pub root: PathBuf,
    pub setup_path: PathBuf,
    /// Present only when the source was an image file.
    pub mount: Option<MountHandle>,
}
