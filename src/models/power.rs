use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four idle timeouts that can put the machine to sleep mid-upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerSetting {
    StandbyAc,
    StandbyDc,
    HibernateAc,
    HibernateDc,
}

impl PowerSetting {
    pub const ALL: [PowerSetting; 4] = [
        PowerSetting::StandbyAc,
        PowerSetting::StandbyDc,
        PowerSetting::HibernateAc,
        PowerSetting::HibernateDc,
    ];

    /// powercfg alias of the setting inside the sleep subgroup.
    pub fn alias(self) -> &'static str {
        match self {
            PowerSetting::StandbyAc | PowerSetting::StandbyDc => "STANDBYIDLE",
            PowerSetting::HibernateAc | PowerSetting::HibernateDc => "HIBERNATEIDLE",
        }
    }

    pub fn is_ac(self) -> bool {
        matches!(self, PowerSetting::StandbyAc | PowerSetting::HibernateAc)
    }
}

impl fmt::Display for PowerSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PowerSetting::StandbyAc => "standby (AC)",
            PowerSetting::StandbyDc => "standby (DC)",
            PowerSetting::HibernateAc => "hibernate (AC)",
            PowerSetting::HibernateDc => "hibernate (DC)",
        };
        f.write_str(name)
    }
}

/// Idle timeouts in seconds as read at the start of a run.
///
/// `None` means the value could not be read, which is different from `Some(0)`
/// (never sleep).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerTimeoutSnapshot {
    pub standby_ac: Option<u32>,
    pub standby_dc: Option<u32>,
    pub hibernate_ac: Option<u32>,
    pub hibernate_dc: Option<u32>,
}

impl PowerTimeoutSnapshot {
    pub fn get(&self, setting: PowerSetting) -> Option<u32> {
        match setting {
            PowerSetting::StandbyAc => self.standby_ac,
            PowerSetting::StandbyDc => self.standby_dc,
            PowerSetting::HibernateAc => self.hibernate_ac,
            PowerSetting::HibernateDc => self.hibernate_dc,
        }
    }

    pub fn set(&mut self, setting: PowerSetting, value: Option<u32>) {
        let slot = match setting {
            PowerSetting::StandbyAc => &mut self.standby_ac,
            PowerSetting::StandbyDc => &mut self.standby_dc,
            PowerSetting::HibernateAc => &mut self.hibernate_ac,
            PowerSetting::HibernateDc => &mut self.hibernate_dc,
        };
        *slot = value;
    }

    /// Value written back on restore; unreadable fields fall back to never (0).
    pub fn restore_value(&self, setting: PowerSetting) -> u32 {
        self.get(setting).unwrap_or(0)
    }

    /// A snapshot with no readable field carries nothing worth restoring.
    pub fn is_usable(&self) -> bool {
        PowerSetting::ALL
            .iter()
            .any(|setting| self.get(*setting).is_some())
    }
}
