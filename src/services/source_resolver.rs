use crate::error::{AppError, Result};
use crate::models::{InstallSource, MountHandle};
use crate::system::SystemContext;
use std::path::{Path, PathBuf};

const SETUP_EXE: &str = "setup.exe";
const IMAGE_EXTENSIONS: [&str; 1] = ["iso"];

/// Turns the configured source (image file or directory) into a runnable
/// `setup.exe`. Never releases a mount; that belongs to teardown.
pub struct SourceResolver<'a, C> {
    ctx: &'a C,
}

impl<'a, C: SystemContext> SourceResolver<'a, C> {
    pub fn new(ctx: &'a C) -> Self {
        Self { ctx }
    }

    /// A created mount is stored in `mount` before anything else can fail, so
    /// the caller owns its release even when resolution errors out.
    pub async fn resolve(
        &self,
        source: &Path,
        mount: &mut Option<MountHandle>,
    ) -> Result<InstallSource> {
        if !source.exists() {
            return Err(AppError::SourceNotFound(source.to_path_buf()));
        }

        let (root, handle) = if is_image(source) {
            let handle = self.ctx.mount_image(source).await?;
            *mount = Some(handle.clone());
            let root = handle
                .root
                .clone()
                .ok_or_else(|| AppError::MountResolution(source.to_path_buf()))?;
            tracing::info!("Mounted {} at {}", source.display(), root.display());
            (root, Some(handle))
        } else if source.is_dir() {
            (std::fs::canonicalize(source)?, None)
        } else {
            let parent = source
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            return Err(AppError::SetupNotFound(parent));
        };

        let setup_path = root.join(SETUP_EXE);
        if !setup_path.is_file() {
            return Err(AppError::SetupNotFound(root));
        }

        Ok(InstallSource {
            root,
            setup_path,
            mount: handle,
        })
    }
}

fn is_image(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                IMAGE_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::fake::FakeSystem;
    use std::fs;

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeSystem::new();
        let mut mount = None;

        let err = SourceResolver::new(&fake)
            .resolve(&dir.path().join("nope"), &mut mount)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SourceNotFound(_)));
        assert!(mount.is_none());
    }

    #[tokio::test]
    async fn directory_source_never_mounts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("setup.exe"), b"MZ").unwrap();
        let fake = FakeSystem::new();
        let mut mount = None;

        let source = SourceResolver::new(&fake)
            .resolve(dir.path(), &mut mount)
            .await
            .unwrap();

        assert_eq!(source.root, fs::canonicalize(dir.path()).unwrap());
        assert_eq!(source.setup_path, source.root.join("setup.exe"));
        assert!(source.mount.is_none());
        assert!(mount.is_none());
        assert!(fake.state.borrow().mounts.is_empty());
    }

    #[tokio::test]
    async fn directory_without_setup_names_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeSystem::new();
        let mut mount = None;

        let err = SourceResolver::new(&fake)
            .resolve(dir.path(), &mut mount)
            .await
            .unwrap_err();

        let root = fs::canonicalize(dir.path()).unwrap();
        assert!(matches!(&err, AppError::SetupNotFound(path) if *path == root));
        assert!(err.to_string().contains(&root.display().to_string()));
    }

    #[tokio::test]
    async fn image_source_mounts_and_finds_setup() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("Win.ISO");
        fs::write(&image, b"image").unwrap();
        let volume = dir.path().join("volume");
        fs::create_dir(&volume).unwrap();
        fs::write(volume.join("setup.exe"), b"MZ").unwrap();
        let fake = FakeSystem::new().with(|s| s.mount_root = Some(volume.clone()));
        let mut mount = None;

        let source = SourceResolver::new(&fake)
            .resolve(&image, &mut mount)
            .await
            .unwrap();

        assert_eq!(source.setup_path, volume.join("setup.exe"));
        assert_eq!(source.mount.as_ref().unwrap().image_path, image);
        assert_eq!(mount, source.mount);
        assert!(fake.state.borrow().dismounts.is_empty());
    }

    #[tokio::test]
    async fn image_without_drive_root_keeps_handle_for_teardown() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("win.iso");
        fs::write(&image, b"image").unwrap();
        let fake = FakeSystem::new();
        let mut mount = None;

        let err = SourceResolver::new(&fake)
            .resolve(&image, &mut mount)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MountResolution(_)));
        assert_eq!(mount.unwrap().image_path, image);
    }

    #[tokio::test]
    async fn plain_file_is_not_a_source() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, b"hello").unwrap();
        let fake = FakeSystem::new();
        let mut mount = None;

        let err = SourceResolver::new(&fake)
            .resolve(&file, &mut mount)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::SetupNotFound(_)));
        assert!(mount.is_none());
    }
}
