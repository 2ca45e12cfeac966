//! # Stage Payloads: Positional Binding and Content Hashing
//!
//! Each stage carries a fixed-shape payload of string fields. Callers supply
//! the payload as an ordered argument list; **field meaning is defined purely
//! by position**. The declared orders below are a compatibility contract with
//! data already on the ledger and must never be reordered.
//!
//! | Stage | Payload | Fields |
//! |---|---|---|
//! | Collected | [`CollectionInfo`] | 29 |
//! | Saved | [`PreservationInfo`] | 14 |
//! | Entered | [`CertificationInfo`] | 6 |
//! | Shared | [`SharingInfo`] | 7 |
//!
//! Binding checks the exact arity, moves values into named fields at once so
//! no lifecycle code ever indexes by position, and stamps `content_hash` over
//! the argument list exactly as supplied.

use germtrace_core::{content_hash, ContentHash};
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;
use crate::stage::Stage;

/// A stage payload bound from a positional argument list.
pub trait StagePayload: Sized + Clone {
    /// The stage this payload belongs to.
    const STAGE: Stage;

    /// Field names in positional order.
    const FIELD_NAMES: &'static [&'static str];

    /// Bind an argument list, checking arity and stamping the content hash.
    fn bind(args: &[String]) -> Result<Self, LifecycleError>;

    /// Field values in positional order.
    fn field_values(&self) -> Vec<&str>;

    /// The hash stamped when the payload was bound.
    fn content_hash(&self) -> &ContentHash;

    /// Hash the current field values again.
    ///
    /// Equal to [`StagePayload::content_hash()`] unless the stored payload
    /// was altered after it was bound.
    fn recompute_hash(&self) -> ContentHash {
        content_hash(self.field_values())
    }
}

/// Field names of a stage's payload, in positional order.
pub fn field_names(stage: Stage) -> &'static [&'static str] {
    match stage {
        Stage::Collected => CollectionInfo::FIELD_NAMES,
        Stage::Saved => PreservationInfo::FIELD_NAMES,
        Stage::Entered => CertificationInfo::FIELD_NAMES,
        Stage::Shared => SharingInfo::FIELD_NAMES,
    }
}

/// Declared argument count of a stage's payload.
pub fn field_count(stage: Stage) -> usize {
    field_names(stage).len()
}

fn check_arity(stage: Stage, expected: usize, args: &[String]) -> Result<(), LifecycleError> {
    if args.len() != expected {
        return Err(LifecycleError::InvalidArgumentCount {
            target: format!("{stage} payload"),
            expected,
            actual: args.len(),
        });
    }
    Ok(())
}

/// Generate a payload struct and its [`StagePayload`] impl from an ordered
/// field list. The order of `$field`s is the positional contract.
macro_rules! stage_payload {
    (
        $(#[$meta:meta])*
        $name:ident for $stage:expr => {
            $( $(#[$fmeta:meta])* $field:ident ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: String, )+
            /// SHA-256 over the argument list this payload was bound from.
            pub content_hash: ContentHash,
        }

        impl StagePayload for $name {
            const STAGE: Stage = $stage;
            const FIELD_NAMES: &'static [&'static str] = &[$(stringify!($field)),+];

            fn bind(args: &[String]) -> Result<Self, LifecycleError> {
                check_arity(Self::STAGE, Self::FIELD_NAMES.len(), args)?;
                let mut values = args.iter().cloned();
                Ok(Self {
                    $( $field: values.next().unwrap_or_default(), )+
                    content_hash: content_hash(args),
                })
            }

            fn field_values(&self) -> Vec<&str> {
                vec![$(self.$field.as_str()),+]
            }

            fn content_hash(&self) -> &ContentHash {
                &self.content_hash
            }
        }
    };
}

stage_payload! {
    /// Field collection record: species identity, provenance, and the
    /// collection site.
    CollectionInfo for Stage::Collected => {
        /// Collection number.
        collect_id,
        /// Crop (fruit tree) type.
        crop_type,
        name,
        germplasm_name,
        /// Germplasm name in English.
        germplasm_name_en,
        /// Botanical family.
        section_name,
        /// Botanical genus.
        generic_name,
        scientific_name,
        resource_type,
        collect_method,
        germplasm_source,
        source_country,
        source_province,
        source,
        source_org,
        origin_country,
        origin_place,
        collect_place_longitude,
        collect_place_latitude,
        collect_place_altitude,
        collect_place_soil_type,
        collect_place_ecology_type,
        collect_material_type,
        collect_people,
        collect_unit,
        collect_time,
        species_name,
        /// Image reference (URL or content id), stored verbatim.
        image,
        collect_remark,
    }
}

stage_payload! {
    /// Preservation record written when the specimen is accessioned.
    PreservationInfo for Stage::Saved => {
        main_preference,
        main_use,
        preservation_facility,
        germplasm_type,
        save_quantity,
        measuring_unit,
        save_unit,
        save_vault,
        save_place,
        warehousing_year,
        save_property,
        resource_description,
        resource_remark,
        germplasm_image,
    }
}

stage_payload! {
    /// Certification record for the preserved specimen.
    CertificationInfo for Stage::Entered => {
        certifier,
        certify_org,
        certify_place,
        certify_year,
        operation_range,
        enter_remark,
    }
}

stage_payload! {
    /// Sharing agreement under which the specimen is released.
    SharingInfo for Stage::Shared => {
        /// Receiving party.
        share_obj,
        contact_info,
        share_mode,
        share_use,
        share_num,
        share_begin_time,
        share_end_time,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Vec<String> {
        (1..=n).map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_declared_field_counts() {
        assert_eq!(field_count(Stage::Collected), 29);
        assert_eq!(field_count(Stage::Saved), 14);
        assert_eq!(field_count(Stage::Entered), 6);
        assert_eq!(field_count(Stage::Shared), 7);
    }

    #[test]
    fn test_collection_binds_positionally() {
        let info = CollectionInfo::bind(&numbered(29)).unwrap();
        assert_eq!(info.collect_id, "1");
        assert_eq!(info.crop_type, "2");
        assert_eq!(info.source_country, "12");
        assert_eq!(info.collect_place_longitude, "18");
        assert_eq!(info.image, "28");
        assert_eq!(info.collect_remark, "29");
    }

    #[test]
    fn test_preservation_binds_positionally() {
        let info = PreservationInfo::bind(&numbered(14)).unwrap();
        assert_eq!(info.main_preference, "1");
        assert_eq!(info.save_vault, "8");
        assert_eq!(info.germplasm_image, "14");
    }

    #[test]
    fn test_certification_and_sharing_bind_positionally() {
        let cert = CertificationInfo::bind(&numbered(6)).unwrap();
        assert_eq!(cert.certifier, "1");
        assert_eq!(cert.enter_remark, "6");
        let share = SharingInfo::bind(&numbered(7)).unwrap();
        assert_eq!(share.share_obj, "1");
        assert_eq!(share.share_end_time, "7");
    }

    #[test]
    fn test_arity_is_exact() {
        for n in [0, 28, 30] {
            let err = CollectionInfo::bind(&numbered(n)).unwrap_err();
            match err {
                LifecycleError::InvalidArgumentCount { expected, actual, .. } => {
                    assert_eq!(expected, 29);
                    assert_eq!(actual, n);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
        assert!(SharingInfo::bind(&numbered(6)).is_err());
        assert!(SharingInfo::bind(&numbered(8)).is_err());
    }

    #[test]
    fn test_arity_error_message() {
        let err = PreservationInfo::bind(&numbered(3)).unwrap_err();
        assert_eq!(err.to_string(), "Saved payload expects 14 arguments, got 3");
    }

    #[test]
    fn test_hash_covers_argument_list() {
        let args = numbered(6);
        let cert = CertificationInfo::bind(&args).unwrap();
        assert_eq!(cert.content_hash, content_hash(&args));
        assert_eq!(cert.recompute_hash(), cert.content_hash);
    }

    #[test]
    fn test_tampered_payload_fails_recompute() {
        let mut share = SharingInfo::bind(&numbered(7)).unwrap();
        share.share_num = "7000".to_string();
        assert_ne!(share.recompute_hash(), share.content_hash);
    }

    #[test]
    fn test_field_values_follow_declared_order() {
        let args = numbered(14);
        let info = PreservationInfo::bind(&args).unwrap();
        let values: Vec<String> = info.field_values().into_iter().map(str::to_string).collect();
        assert_eq!(values, args);
        assert_eq!(PreservationInfo::FIELD_NAMES[9], "warehousing_year");
    }

    #[test]
    fn test_serialized_field_names() {
        let info = CertificationInfo::bind(&numbered(6)).unwrap();
        let value = serde_json::to_value(&info).unwrap();
        let obj = value.as_object().unwrap();
        for name in CertificationInfo::FIELD_NAMES {
            assert!(obj.contains_key(*name), "missing {name}");
        }
        assert!(obj.contains_key("content_hash"));
    }
}
