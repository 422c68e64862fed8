use crate::version::SemVer;
use serde::{Deserialize, Serialize};

/// Contents of the single metadata row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaInfo {
    /// Number of migrations currently applied.
    pub database_version: u32,
    /// Service version stored as `[major, minor, patch]`.
    #[serde(with = "service_version_array")]
    pub service_version: SemVer,
}

mod service_version_array {
    use crate::version::SemVer;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(version: &SemVer, serializer: S) -> Result<S::Ok, S::Error> {
        version.to_parts().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SemVer, D::Error> {
        let parts = <[u32; 3]>::deserialize(deserializer)?;
        Ok(SemVer::from(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_info_json_shape() {
        let info = MetaInfo {
            database_version: 4,
            service_version: SemVer::new(1, 2, 3),
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "database_version": 4, "service_version": [1, 2, 3] })
        );

        let back: MetaInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }
}
