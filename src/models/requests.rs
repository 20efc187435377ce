use serde::{Deserialize, Serialize};

/// Body of `POST /anonymous-session`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRequest {
    pub device_id: String,
    pub platform: String,
}

impl SessionRequest {
    /// Build a request for this device
    ///
    /// There is no stable hardware identifier, so the device id is the
    /// platform name plus a timestamp and a random suffix.
    pub fn for_this_device(now_millis: i64) -> Self {
        let platform = std::env::consts::OS.to_string();
        Self {
            device_id: format!("{}_{}_{}", platform, now_millis, random_suffix()),
            platform,
        }
    }
}

/// Nine random lowercase alphanumerics
pub(crate) fn random_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..9].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_id_shape() {
        let req = SessionRequest::for_this_device(1_700_000_000_000);
        assert!(req.device_id.starts_with(&format!("{}_1700000000000_", req.platform)));
        assert_eq!(req.device_id.rsplit('_').next().unwrap().len(), 9);
    }
}
