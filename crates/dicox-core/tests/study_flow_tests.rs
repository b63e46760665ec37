//! End-to-end study lifecycle tests through the service facade.

use anyhow::Result;
use proptest::prelude::*;

use dicox_core::{NewStudy, StoreError, StudyService, StudyStatus, StudyUpdate};

#[test]
fn test_create_scenario_from_fresh_store() -> Result<()> {
    let service = StudyService::open_in_memory()?;

    let record = service.create_study(&NewStudy::new("Jane Doe", "X-ray"))?;

    assert_eq!(record.receipt_number, "1");
    assert_eq!(record.status, StudyStatus::Paid);
    assert!(!record.processed);
    assert_eq!(service.next_receipt_preview()?, 2);
    Ok(())
}

#[test]
fn test_full_lifecycle() -> Result<()> {
    let service = StudyService::open_in_memory()?;

    let mut input = NewStudy::new("Jane Doe", "X-ray");
    input.amount = Some("1500".into());
    input.payment_method = Some("cash".into());
    let record = service.create_study(&input)?;

    // Pending until marked
    let pending = service.list_pending_studies()?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, record.id);

    // Edit business fields
    let mut fields = StudyUpdate::from(&record);
    fields.client = "ACME Insurance".into();
    service.update_study(record.id, &fields)?;

    // Process, then the pending list is empty
    service.mark_processed(record.id)?;
    assert!(service.list_pending_studies()?.is_empty());
    assert_eq!(service.list_studies()?.len(), 1);

    // Annul is terminal and zeroes the amount
    service.annul_study(record.id)?;
    let stored = service.get_study(record.id)?.unwrap();
    assert_eq!(stored.status, StudyStatus::Annulled);
    assert_eq!(stored.amount, "0");
    assert_eq!(stored.client, "ACME Insurance");
    assert_eq!(stored.receipt_number, record.receipt_number);

    let snapshot = service.health_snapshot()?;
    assert_eq!(snapshot.total, 1);
    assert_eq!(snapshot.pending, 0);
    assert_eq!(snapshot.next_receipt, 2);
    Ok(())
}

#[test]
fn test_identical_inputs_get_distinct_receipts() -> Result<()> {
    let service = StudyService::open_in_memory()?;

    let input = NewStudy::new("Jane Doe", "X-ray");
    let first = service.create_study(&input)?;
    let second = service.create_study(&input)?;

    assert_eq!(first.receipt_number, "1");
    assert_eq!(second.receipt_number, "2");
    assert_ne!(first.id, second.id);
    Ok(())
}

#[test]
fn test_not_found_propagates_through_service() -> Result<()> {
    let service = StudyService::open_in_memory()?;

    assert!(matches!(
        service.mark_processed(42),
        Err(StoreError::NotFound(_))
    ));
    assert!(matches!(
        service.annul_study(42),
        Err(StoreError::NotFound(_))
    ));
    assert!(service.get_study(42)?.is_none());
    Ok(())
}

#[test]
fn test_records_survive_restart() -> Result<()> {
    let file = tempfile::NamedTempFile::new()?;

    let id = {
        let service = StudyService::open(file.path())?;
        service.create_study(&NewStudy::new("Jane Doe", "X-ray"))?.id
    };

    let service = StudyService::open(file.path())?;
    let stored = service.get_study(id)?.unwrap();
    assert_eq!(stored.patient_name, "Jane Doe");
    assert_eq!(stored.receipt_number, "1");
    assert_eq!(service.next_receipt_preview()?, 2);
    Ok(())
}

proptest! {
    /// Any batch of valid inputs receives the dense receipt range 1..=n,
    /// one number per record, in creation order.
    #[test]
    fn prop_valid_creates_get_dense_sequential_receipts(
        inputs in prop::collection::vec(("[A-Za-z][A-Za-z ]{0,19}", "[A-Za-z][A-Za-z ]{0,39}"), 1..20)
    ) {
        let service = StudyService::open_in_memory().unwrap();

        for (i, (patient_name, description)) in inputs.iter().enumerate() {
            let record = service
                .create_study(&NewStudy::new(patient_name.clone(), description.clone()))
                .unwrap();
            prop_assert_eq!(record.receipt_number, (i + 1).to_string());
            prop_assert_eq!(&record.patient_name, patient_name);
        }

        let snapshot = service.health_snapshot().unwrap();
        prop_assert_eq!(snapshot.total, inputs.len() as u64);
        prop_assert_eq!(snapshot.next_receipt, inputs.len() as u64 + 1);
    }

    /// Whitespace-only required fields are rejected without burning a number.
    #[test]
    fn prop_blank_input_never_consumes_a_receipt(blank in "[ \t]{0,5}") {
        let service = StudyService::open_in_memory().unwrap();

        let result = service.create_study(&NewStudy::new(blank.clone(), "X-ray"));
        prop_assert!(matches!(result, Err(StoreError::Validation(_))));
        let result = service.create_study(&NewStudy::new("Jane Doe", blank));
        prop_assert!(matches!(result, Err(StoreError::Validation(_))));

        prop_assert_eq!(service.next_receipt_preview().unwrap(), 1);
    }
}
