use super::SystemContext;
use crate::error::{AppError, Result};
use crate::models::{
    DownloadReport, InstallReport, MountHandle, OperationResultCode, PowerSetting,
    UpdateCriteria, UpdateItem,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    Search,
    Download,
    Install,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub power: HashMap<PowerSetting, u32>,
    pub unreadable: HashSet<PowerSetting>,
    pub unwritable: HashSet<PowerSetting>,
    pub power_writes: Vec<(PowerSetting, u32)>,

    pub found: Vec<UpdateItem>,
    pub downloadable: HashSet<String>,
    pub install_results: Vec<OperationResultCode>,
    pub install_reboot: bool,
    pub failing_stage: Option<UpdateStage>,
    pub searched: Vec<String>,
    pub downloaded_batches: Vec<Vec<String>>,
    pub installed_batches: Vec<Vec<String>>,

    pub mount_root: Option<PathBuf>,
    pub fail_mount: bool,
    pub fail_dismount: bool,
    pub mounts: Vec<PathBuf>,
    pub dismounts: Vec<PathBuf>,

    pub installer_exit: i32,
    pub fail_launch: bool,
    pub launches: Vec<(PathBuf, Vec<String>)>,
}

/// Recording stand-in for the live machine.
#[derive(Debug, Default)]
pub struct FakeSystem {
    pub state: RefCell<FakeState>,
}

impl FakeSystem {
    pub fn new() -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.borrow_mut();
            state.power.insert(PowerSetting::StandbyAc, 1800);
            state.power.insert(PowerSetting::StandbyDc, 900);
            state.power.insert(PowerSetting::HibernateAc, 3600);
            state.power.insert(PowerSetting::HibernateDc, 1200);
        }
        fake
    }

    pub fn with<F: FnOnce(&mut FakeState)>(self, configure: F) -> Self {
        configure(&mut *self.state.borrow_mut());
        self
    }

    pub fn power_value(&self, setting: PowerSetting) -> Option<u32> {
        self.state.borrow().power.get(&setting).copied()
    }

    pub fn launch_count(&self) -> usize {
        self.state.borrow().launches.len()
    }

    pub fn dismount_count(&self) -> usize {
        self.state.borrow().dismounts.len()
    }

    /// Writes that happened after the first four (the disable pass).
    pub fn restore_writes(&self) -> Vec<(PowerSetting, u32)> {
        self.state
            .borrow()
            .power_writes
            .iter()
            .skip(PowerSetting::ALL.len())
            .copied()
            .collect()
    }
}

pub fn update(id: &str) -> UpdateItem {
    UpdateItem {
        id: id.to_string(),
        title: format!("Update {}", id),
        is_downloaded: false,
    }
}

impl SystemContext for FakeSystem {
    async fn read_power_timeout(&self, setting: PowerSetting) -> Result<u32> {
        let state = self.state.borrow();
        if state.unreadable.contains(&setting) {
            return Err(AppError::Power(format!("cannot read {}", setting)));
        }
        state
            .power
            .get(&setting)
            .copied()
            .ok_or_else(|| AppError::Power(format!("no value for {}", setting)))
    }

    async fn write_power_timeout(&self, setting: PowerSetting, seconds: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.power_writes.push((setting, seconds));
        if state.unwritable.contains(&setting) {
            return Err(AppError::Power(format!("cannot write {}", setting)));
        }
        state.power.insert(setting, seconds);
        Ok(())
    }

    async fn search_updates(&self, criteria: &UpdateCriteria) -> Result<Vec<UpdateItem>> {
        let mut state = self.state.borrow_mut();
        state.searched.push(criteria.query());
        if state.failing_stage == Some(UpdateStage::Search) {
            return Err(AppError::Update("search service unavailable".to_string()));
        }
        Ok(state.found.clone())
    }

    async fn download_updates(&self, items: &[UpdateItem]) -> Result<DownloadReport> {
        let mut state = self.state.borrow_mut();
        state
            .downloaded_batches
            .push(items.iter().map(|item| item.id.clone()).collect());
        if state.failing_stage == Some(UpdateStage::Download) {
            return Err(AppError::Update("download interrupted".to_string()));
        }
        let items: Vec<UpdateItem> = items
            .iter()
            .map(|item| UpdateItem {
                is_downloaded: state.downloadable.contains(&item.id),
                ..item.clone()
            })
            .collect();
        let result_code = if items.iter().all(|item| item.is_downloaded) {
            OperationResultCode::Succeeded
        } else {
            OperationResultCode::SucceededWithErrors
        };
        Ok(DownloadReport { result_code, items })
    }

    async fn install_updates(&self, items: &[UpdateItem]) -> Result<InstallReport> {
        let mut state = self.state.borrow_mut();
        state
            .installed_batches
            .push(items.iter().map(|item| item.id.clone()).collect());
        if state.failing_stage == Some(UpdateStage::Install) {
            return Err(AppError::Update("installer busy".to_string()));
        }
        let item_results: Vec<OperationResultCode> = (0..items.len())
            .map(|i| {
                state
                    .install_results
                    .get(i)
                    .copied()
                    .unwrap_or(OperationResultCode::Succeeded)
            })
            .collect();
        Ok(InstallReport {
            result_code: OperationResultCode::Succeeded,
            reboot_required: state.install_reboot,
            item_results,
        })
    }

    async fn mount_image(&self, image: &Path) -> Result<MountHandle> {
        let mut state = self.state.borrow_mut();
        if state.fail_mount {
            return Err(AppError::Mount("image is corrupt".to_string()));
        }
        state.mounts.push(image.to_path_buf());
        Ok(MountHandle {
            image_path: image.to_path_buf(),
            root: state.mount_root.clone(),
        })
    }

    async fn dismount_image(&self, handle: &MountHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.dismounts.push(handle.image_path.clone());
        if state.fail_dismount {
            return Err(AppError::Mount("volume in use".to_string()));
        }
        Ok(())
    }

    async fn run_installer(&self, setup_path: &Path, args: &[String]) -> Result<i32> {
        let mut state = self.state.borrow_mut();
        state
            .launches
            .push((setup_path.to_path_buf(), args.to_vec()));
        if state.fail_launch {
            return Err(AppError::Launch("access denied".to_string()));
        }
        Ok(state.installer_exit)
    }
}
