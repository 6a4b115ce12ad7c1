//! User profile and role rules.

use serde::{Deserialize, Serialize};

use super::spj::{Bidang, Spj};

/// Job title of the administrative treasurer role.
pub const ADMIN_JABATAN: &str = "Bendahara Pengeluaran";

/// Profile of an authenticated account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Opaque account id from the identity provider.
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Employee number.
    pub nip: Option<String>,
    /// Job title.
    pub jabatan: Option<String>,
    pub bidang: Option<Bidang>,
}

impl UserProfile {
    /// Whether this account holds the treasurer role.
    pub fn is_admin(&self) -> bool {
        self.jabatan.as_deref() == Some(ADMIN_JABATAN)
    }

    pub fn full_name(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Division the listing should be scoped to by default.
    ///
    /// `None` means all divisions.
    pub fn default_bidang(&self) -> Option<Bidang> {
        if self.is_admin() {
            None
        } else {
            self.bidang
        }
    }

    pub fn can_edit(&self, spj: &Spj) -> bool {
        self.is_admin() || (self.bidang.is_some() && spj.bidang == self.bidang)
    }

    pub fn can_delete(&self) -> bool {
        self.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JenisSpj;
    use chrono::NaiveDate;

    fn staff(bidang: Bidang) -> UserProfile {
        UserProfile {
            id: "u-1".to_string(),
            first_name: Some("Lalu".to_string()),
            last_name: Some("Hamdi".to_string()),
            jabatan: Some("Staf".to_string()),
            bidang: Some(bidang),
            ..Default::default()
        }
    }

    fn admin() -> UserProfile {
        UserProfile {
            id: "u-0".to_string(),
            jabatan: Some(ADMIN_JABATAN.to_string()),
            bidang: Some(Bidang::Sekretariat),
            ..Default::default()
        }
    }

    fn spj(bidang: Option<Bidang>) -> Spj {
        Spj {
            id: "s-1".to_string(),
            nomor_pembukuan: "001".to_string(),
            kode_rekening: "5.1".to_string(),
            jenis_spj: JenisSpj::Gu,
            bidang,
            tanggal: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            uraian: "x".to_string(),
            jumlah: 10,
            file_url: None,
        }
    }

    #[test]
    fn test_admin_sees_all_divisions() {
        assert!(admin().is_admin());
        assert_eq!(admin().default_bidang(), None);
        assert!(admin().can_delete());
        assert!(admin().can_edit(&spj(Some(Bidang::Ekonomi))));
    }

    #[test]
    fn test_staff_scoped_to_own_division() {
        let user = staff(Bidang::Sosbud);
        assert!(!user.is_admin());
        assert_eq!(user.default_bidang(), Some(Bidang::Sosbud));
        assert!(!user.can_delete());
        assert!(user.can_edit(&spj(Some(Bidang::Sosbud))));
        assert!(!user.can_edit(&spj(Some(Bidang::Ekonomi))));
        assert!(!user.can_edit(&spj(None)));
    }

    #[test]
    fn test_full_name_skips_missing_parts() {
        assert_eq!(staff(Bidang::Ekonomi).full_name(), "Lalu Hamdi");
        assert_eq!(admin().full_name(), "");
    }
}
