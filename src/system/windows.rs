use super::SystemContext;
use crate::error::{AppError, Result};
use crate::models::{
    DownloadReport, InstallReport, MountHandle, OperationResultCode, PowerSetting,
    UpdateCriteria, UpdateItem,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const SCHEME: &str = "SCHEME_CURRENT";
const SLEEP_SUBGROUP: &str = "SUB_SLEEP";
// Broad criteria used to re-locate previously searched updates by id.
const PENDING_CRITERIA: &str = "IsInstalled=0 and IsHidden=0";

const SEARCH_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
$session = New-Object -ComObject Microsoft.Update.Session
$result = $session.CreateUpdateSearcher().Search({criteria})
$items = @(foreach ($u in $result.Updates) {
    [pscustomobject]@{ id = $u.Identity.UpdateID; title = $u.Title; is_downloaded = [bool]$u.IsDownloaded }
})
ConvertTo-Json -Compress -Depth 3 -InputObject $items
"#;

const DOWNLOAD_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
$ids = @({ids})
$session = New-Object -ComObject Microsoft.Update.Session
$result = $session.CreateUpdateSearcher().Search({criteria})
$updates = New-Object -ComObject Microsoft.Update.UpdateColl
foreach ($u in $result.Updates) { if ($ids -contains $u.Identity.UpdateID) { [void]$updates.Add($u) } }
$downloader = $session.CreateUpdateDownloader()
$downloader.Updates = $updates
$download = $downloader.Download()
$items = @(foreach ($u in $updates) {
    [pscustomobject]@{ id = $u.Identity.UpdateID; title = $u.Title; is_downloaded = [bool]$u.IsDownloaded }
})
ConvertTo-Json -Compress -Depth 3 -InputObject ([pscustomobject]@{ result_code = [int]$download.ResultCode; items = $items })
"#;

const INSTALL_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
$ids = @({ids})
$session = New-Object -ComObject Microsoft.Update.Session
$result = $session.CreateUpdateSearcher().Search({criteria})
$updates = New-Object -ComObject Microsoft.Update.UpdateColl
foreach ($u in $result.Updates) {
    if ($u.IsDownloaded -and ($ids -contains $u.Identity.UpdateID)) { [void]$updates.Add($u) }
}
$installer = $session.CreateUpdateInstaller()
$installer.ForceQuiet = $true
$installer.Updates = $updates
$install = $installer.Install()
$codes = @(for ($i = 0; $i -lt $updates.Count; $i++) { [int]$install.GetUpdateResult($i).ResultCode })
ConvertTo-Json -Compress -Depth 3 -InputObject ([pscustomobject]@{ result_code = [int]$install.ResultCode; reboot_required = [bool]$install.RebootRequired; item_results = $codes })
"#;

const MOUNT_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
$image = Mount-DiskImage -ImagePath {path} -StorageType ISO -Access ReadOnly -PassThru
$ErrorActionPreference = 'Continue'
$letter = ''
for ($i = 0; $i -lt 10 -and -not $letter; $i++) {
    try { $letter = ($image | Get-Volume -ErrorAction Stop).DriveLetter } catch { Start-Sleep -Milliseconds 500 }
}
"$letter"
"#;

const DISMOUNT_SCRIPT: &str = r#"
$ErrorActionPreference = 'Stop'
Dismount-DiskImage -ImagePath {path} | Out-Null
"#;

#[derive(Debug, Deserialize)]
struct RawDownload {
    result_code: i32,
    #[serde(default)]
    items: Vec<UpdateItem>,
}

#[derive(Debug, Deserialize)]
struct RawInstall {
    result_code: i32,
    reboot_required: bool,
    #[serde(default)]
    item_results: Vec<i32>,
}

/// Live machine backed by `powercfg`, PowerShell and the update agent COM API.
#[derive(Clone)]
pub struct WindowsSystem {
    powercfg: String,
    powershell: String,
}

impl WindowsSystem {
    pub fn new() -> Self {
        Self {
            powercfg: "powercfg.exe".to_string(),
            powershell: "powershell.exe".to_string(),
        }
    }

    async fn powercfg(&self, args: &[&str]) -> Result<String> {
        run_captured(&self.powercfg, args)
            .await
            .map_err(AppError::Power)
    }

    async fn powershell(&self, script: &str) -> std::result::Result<String, String> {
        run_captured(
            &self.powershell,
            &[
                "-NoProfile",
                "-NonInteractive",
                "-ExecutionPolicy",
                "Bypass",
                "-Command",
                script,
            ],
        )
        .await
    }
}

impl Default for WindowsSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemContext for WindowsSystem {
    async fn read_power_timeout(&self, setting: PowerSetting) -> Result<u32> {
        let output = self
            .powercfg(&["/query", SCHEME, SLEEP_SUBGROUP, setting.alias()])
            .await?;
        parse_power_query(&output, setting.is_ac()).ok_or_else(|| {
            AppError::Power(format!("Unexpected powercfg output for {}", setting))
        })
    }

    async fn write_power_timeout(&self, setting: PowerSetting, seconds: u32) -> Result<()> {
        let verb = if setting.is_ac() {
            "/setacvalueindex"
        } else {
            "/setdcvalueindex"
        };
        let value = seconds.to_string();
        self.powercfg(&[verb, SCHEME, SLEEP_SUBGROUP, setting.alias(), &value])
            .await?;
        self.powercfg(&["/setactive", SCHEME]).await?;
        Ok(())
    }

    async fn search_updates(&self, criteria: &UpdateCriteria) -> Result<Vec<UpdateItem>> {
        let script = SEARCH_SCRIPT.replace("{criteria}", &ps_quote(&criteria.query()));
        let output = self.powershell(&script).await.map_err(AppError::Update)?;
        serde_json::from_str(output.trim())
            .map_err(|e| AppError::Update(format!("Invalid search result: {}", e)))
    }

    async fn download_updates(&self, items: &[UpdateItem]) -> Result<DownloadReport> {
        let script = DOWNLOAD_SCRIPT
            .replace("{ids}", &ps_id_list(items))
            .replace("{criteria}", &ps_quote(PENDING_CRITERIA));
        let output = self.powershell(&script).await.map_err(AppError::Update)?;
        let raw: RawDownload = serde_json::from_str(output.trim())
            .map_err(|e| AppError::Update(format!("Invalid download result: {}", e)))?;
        Ok(DownloadReport {
            result_code: result_code(raw.result_code)?,
            items: raw.items,
        })
    }

    async fn install_updates(&self, items: &[UpdateItem]) -> Result<InstallReport> {
        let script = INSTALL_SCRIPT
            .replace("{ids}", &ps_id_list(items))
            .replace("{criteria}", &ps_quote(PENDING_CRITERIA));
        let output = self.powershell(&script).await.map_err(AppError::Update)?;
        let raw: RawInstall = serde_json::from_str(output.trim())
            .map_err(|e| AppError::Update(format!("Invalid install result: {}", e)))?;
        let item_results = raw
            .item_results
            .into_iter()
            .map(result_code)
            .collect::<Result<Vec<_>>>()?;
        Ok(InstallReport {
            result_code: result_code(raw.result_code)?,
            reboot_required: raw.reboot_required,
            item_results,
        })
    }

    async fn mount_image(&self, image: &Path) -> Result<MountHandle> {
        let script = MOUNT_SCRIPT.replace("{path}", &ps_quote(&image.to_string_lossy()));
        let output = self.powershell(&script).await.map_err(AppError::Mount)?;
        Ok(mount_handle(image, &output))
    }

    async fn dismount_image(&self, handle: &MountHandle) -> Result<()> {
        let script =
            DISMOUNT_SCRIPT.replace("{path}", &ps_quote(&handle.image_path.to_string_lossy()));
        self.powershell(&script).await.map_err(AppError::Mount)?;
        Ok(())
    }

    async fn run_installer(&self, setup_path: &Path, args: &[String]) -> Result<i32> {
        let status = tokio::process::Command::new(setup_path)
            .args(args)
            .status()
            .await
            .map_err(|e| {
                AppError::Launch(format!("Failed to start {}: {}", setup_path.display(), e))
            })?;

        status.code().ok_or_else(|| {
            AppError::Launch("Installer terminated without an exit code".to_string())
        })
    }
}

/// Runs a helper command, returning stdout or a message built from stderr.
async fn run_captured(program: &str, args: &[&str]) -> std::result::Result<String, String> {
    let mut cmd = tokio::process::Command::new(program);
    cmd.args(args);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let output = cmd
        .output()
        .await
        .map_err(|e| format!("Failed to run {}: {}", program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} exited with {:?}: {}",
            program,
            output.status.code(),
            stderr.trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn result_code(raw: i32) -> Result<OperationResultCode> {
    OperationResultCode::from_raw(raw)
        .ok_or_else(|| AppError::Update(format!("Unknown operation result code {}", raw)))
}

/// The query prints the possible-value range before the current AC and DC
/// indices, so the last two hex values are AC then DC regardless of locale.
fn parse_power_query(output: &str, ac: bool) -> Option<u32> {
    let values: Vec<u32> = output
        .lines()
        .filter_map(|line| line.rsplit(':').next())
        .filter_map(|value| value.trim().strip_prefix("0x"))
        .filter_map(|hex| u32::from_str_radix(hex, 16).ok())
        .collect();

    if values.len() < 2 {
        return None;
    }
    let index = if ac { values.len() - 2 } else { values.len() - 1 };
    Some(values[index])
}

/// Once `Mount-DiskImage` succeeded the script always exits cleanly, so a
/// missing drive letter still yields a handle for teardown to release.
fn mount_handle(image: &Path, output: &str) -> MountHandle {
    MountHandle {
        image_path: image.to_path_buf(),
        root: drive_root(output),
    }
}

fn drive_root(output: &str) -> Option<PathBuf> {
    let letter = output.trim().chars().next()?;
    if !letter.is_ascii_alphabetic() {
        return None;
    }
    Some(PathBuf::from(format!("{}:\\", letter.to_ascii_uppercase())))
}

fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn ps_id_list(items: &[UpdateItem]) -> String {
    items
        .iter()
        .map(|item| ps_quote(&item.id))
        .collect::<Vec<_>>()
        .join(",")
}
