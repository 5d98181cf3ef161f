use clinic_core::{Gender, Patient, PatientProfile, PatientValidationError, ReminderChannel};
use uuid::Uuid;

#[test]
fn patient_new_sets_defaults() {
    let tenant_id = Uuid::new_v4();
    let patient = Patient::new(tenant_id, "Maria Silva");

    assert!(!patient.id.is_nil());
    assert_eq!(patient.tenant_id, tenant_id);
    assert_eq!(patient.document, "");
    assert!(!patient.has_document());
    assert!(patient.active);
    assert_eq!(patient.profile.reminder_channel, ReminderChannel::Whatsapp);
    assert_eq!(patient.profile.insurance.name, "Particular");
}

#[test]
fn with_id_rejects_nil_uuid() {
    let err = Patient::with_id(Uuid::nil(), Uuid::new_v4(), "Maria").unwrap_err();
    assert_eq!(err, PatientValidationError::NilUuid);
}

#[test]
fn validate_checks_structure_but_not_cpf() {
    let tenant_id = Uuid::new_v4();

    assert_eq!(
        Patient::new(Uuid::nil(), "Maria").validate(),
        Err(PatientValidationError::NilTenant)
    );
    assert_eq!(
        Patient::new(tenant_id, "  ").validate(),
        Err(PatientValidationError::BlankFullName)
    );
    assert!(matches!(
        Patient::new(tenant_id, "x".repeat(256)).validate(),
        Err(PatientValidationError::FullNameTooLong { max: 255, actual: 256 })
    ));

    // Arithmetic validity is the explicit validation path's concern.
    let patient = Patient::new(tenant_id, "Maria").with_document("00000000000");
    assert_eq!(patient.validate(), Ok(()));
    assert!(patient.has_document());
}

#[test]
fn patient_serialization_uses_expected_wire_fields() {
    let patient_id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();
    let tenant_id = Uuid::parse_str("66666666-7777-4888-9999-000000000000").unwrap();
    let mut patient = Patient::with_id(patient_id, tenant_id, "Maria Silva")
        .unwrap()
        .with_document("11144477735");
    patient.profile.gender = Some(Gender::Female);
    patient.profile.reminder_channel = ReminderChannel::None;

    let json = serde_json::to_value(&patient).unwrap();
    assert_eq!(json["id"], "11111111-2222-4333-8444-555555555555");
    assert_eq!(json["tenant_id"], "66666666-7777-4888-9999-000000000000");
    assert_eq!(json["cpf"], "11144477735");
    assert!(json.get("document").is_none());
    assert_eq!(json["profile"]["gender"], "F");
    assert_eq!(json["profile"]["reminder_channel"], "none");
    assert_eq!(json["profile"]["insurance"]["name"], "Particular");

    let decoded: Patient = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, patient);
}

#[test]
fn partial_profile_json_fills_defaults() {
    let profile: PatientProfile = serde_json::from_str(
        r#"{"mobile_phone":"(71) 99999-0000","address":{"city":"Salvador","state":"BA"}}"#,
    )
    .unwrap();

    assert_eq!(profile.mobile_phone.as_deref(), Some("(71) 99999-0000"));
    assert_eq!(profile.address.city.as_deref(), Some("Salvador"));
    assert_eq!(profile.address.cep, None);
    assert_eq!(profile.reminder_channel, ReminderChannel::Whatsapp);
    assert_eq!(profile.insurance.name, "Particular");
    assert!(!profile.is_foreign);
}
