//! Write requests and read results for the census tables
//!
//! Timestamps are epoch seconds (UTC), matching the integer columns of the
//! schema. Optional-argument defaults are resolved by the `resolved_*`
//! methods just before a request is turned into a statement.

use chrono::Utc;
use serde::Serialize;

use super::RunStatus;

/// Company type recorded when a developer id is known and no type was given.
pub const DEVELOPER_COMPANY_TYPE: &str = "dev";

/// Current UTC time as epoch seconds.
pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// Company type policy: an explicit type always wins, a developer id implies
/// [`DEVELOPER_COMPANY_TYPE`], otherwise the type stays unset.
pub fn company_type_for<'a>(
    google_dev_id: Option<&str>,
    company_type: Option<&'a str>,
) -> Option<&'a str> {
    match (company_type, google_dev_id) {
        (Some(explicit), _) => Some(explicit),
        (None, Some(_)) => Some(DEVELOPER_COMPANY_TYPE),
        (None, None) => None,
    }
}

/// Company upsert request, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompany {
    pub name: String,
    pub google_dev_id: Option<String>,
    pub company_type: Option<String>,
}

impl NewCompany {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            google_dev_id: None,
            company_type: None,
        }
    }

    pub fn with_google_dev_id(mut self, dev_id: impl Into<String>) -> Self {
        self.google_dev_id = Some(dev_id.into());
        self
    }

    pub fn with_type(mut self, company_type: impl Into<String>) -> Self {
        self.company_type = Some(company_type.into());
        self
    }

    pub fn resolved_type(&self) -> Option<&str> {
        company_type_for(self.google_dev_id.as_deref(), self.company_type.as_deref())
    }
}

/// App upsert request, keyed by `package_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApp {
    pub dev_company_id: i64,
    pub package_name: String,
    pub common_name: String,
    pub product_url: Option<String>,
    /// Falls back to [`current_timestamp`] when unset.
    pub last_checked: Option<i64>,
    pub icon_url: Option<String>,
    pub install_count: i64,
    pub run_status: RunStatus,
    pub is_family: bool,
}

impl NewApp {
    pub fn new(
        dev_company_id: i64,
        package_name: impl Into<String>,
        common_name: impl Into<String>,
    ) -> Self {
        Self {
            dev_company_id,
            package_name: package_name.into(),
            common_name: common_name.into(),
            product_url: None,
            last_checked: None,
            icon_url: None,
            install_count: 0,
            run_status: RunStatus::Available,
            is_family: false,
        }
    }

    pub fn resolved_last_checked(&self) -> i64 {
        self.last_checked.unwrap_or_else(current_timestamp)
    }
}

/// Release upsert request, keyed by `(app_id, version_code)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelease {
    pub app_id: i64,
    pub version_code: i64,
    pub version_string: String,
    pub timestamp_publish: i64,
    pub timestamp_download: Option<i64>,
    pub has_in_app_purchases: Option<bool>,
    pub has_ads: Option<bool>,
    pub social_networks: Option<bool>,
    pub tested: bool,
}

impl NewRelease {
    pub fn new(
        app_id: i64,
        version_code: i64,
        version_string: impl Into<String>,
        timestamp_publish: i64,
    ) -> Self {
        Self {
            app_id,
            version_code,
            version_string: version_string.into(),
            timestamp_publish,
            timestamp_download: None,
            has_in_app_purchases: None,
            has_ads: None,
            social_networks: None,
            tested: false,
        }
    }
}

/// One permission observation for a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    pub release_id: i64,
    pub permission: String,
    pub timestamp: i64,
    pub is_used: bool,
    pub tester_id: Option<String>,
}

impl NewPermission {
    pub fn new(release_id: i64, permission: impl Into<String>, timestamp: i64) -> Self {
        Self {
            release_id,
            permission: permission.into(),
            timestamp,
            is_used: false,
            tester_id: None,
        }
    }
}

/// One observed network transmission for a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransmission {
    pub release_id: i64,
    pub data_type: String,
    pub timestamp: i64,
    pub domain: Option<String>,
    pub tls_sni: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<u16>,
    pub is_tls: bool,
    pub payload: Option<String>,
    pub tester_id: Option<String>,
}

impl NewTransmission {
    pub fn new(release_id: i64, data_type: impl Into<String>, timestamp: i64) -> Self {
        Self {
            release_id,
            data_type: data_type.into(),
            timestamp,
            domain: None,
            tls_sni: None,
            ip_address: None,
            port: None,
            is_tls: false,
            payload: None,
            tester_id: None,
        }
    }
}

/// Scheduler pick: the app and the newest untested version to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppToTest {
    pub package_name: String,
    pub version_code: i64,
    pub install_count: i64,
    pub priority: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_company_type_wins() {
        assert_eq!(company_type_for(Some("1234"), Some("publisher")), Some("publisher"));
        assert_eq!(company_type_for(None, Some("publisher")), Some("publisher"));
    }

    #[test]
    fn developer_id_implies_dev_type() {
        assert_eq!(company_type_for(Some("1234"), None), Some("dev"));
        assert_eq!(company_type_for(None, None), None);

        let company = NewCompany::new("Example Corp").with_google_dev_id("5700313618786177705");
        assert_eq!(company.resolved_type(), Some(DEVELOPER_COMPANY_TYPE));
    }

    #[test]
    fn app_defaults() {
        let app = NewApp::new(7, "com.example.app", "Example");
        assert_eq!(app.install_count, 0);
        assert_eq!(app.run_status, RunStatus::Available);
        assert!(!app.is_family);

        let before = current_timestamp();
        let resolved = app.resolved_last_checked();
        assert!(resolved >= before);

        let pinned = NewApp {
            last_checked: Some(1_500_000_000),
            ..app
        };
        assert_eq!(pinned.resolved_last_checked(), 1_500_000_000);
    }

    #[test]
    fn release_starts_untested() {
        let release = NewRelease::new(3, 42, "1.4.2", 1_600_000_000);
        assert!(!release.tested);
        assert_eq!(release.timestamp_download, None);
    }
}
