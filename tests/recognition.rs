use chrono::Utc;
use ponto::{find_best_match, timesheet, Embedding, EnrollmentRecord, Store, TimeEntry};

fn enrollment(employee_id: &str, name: &str, embedding: Vec<f32>) -> EnrollmentRecord {
    EnrollmentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        employee_id: employee_id.to_string(),
        employee_name: name.to_string(),
        embedding,
        algorithm: "faceapi-0.22".to_string(),
        captured_at: Utc::now(),
        source_photo: None,
    }
}

// Unit vector with cosine similarity `s` against [1, 0, 0, ...].
fn unit_at(s: f32, dim: usize) -> Vec<f32> {
    let mut v = vec![0.0; dim];
    v[0] = s;
    v[1] = (1.0 - s * s).sqrt();
    v
}

fn axis(dim: usize) -> Embedding {
    let mut v = vec![0.0; dim];
    v[0] = 1.0;
    Embedding::from_vec(v)
}

#[test]
fn badge_flow_from_store_to_time_entry() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path());

    store
        .save_enrollment("acme", enrollment("e1", "Ana", unit_at(0.97, 128)))
        .unwrap();
    store
        .save_enrollment("acme", enrollment("e2", "Bruno", unit_at(0.30, 128)))
        .unwrap();

    let pool = store.load_enrollments("acme").unwrap();
    let result = find_best_match(&axis(128), &pool, 0.90).unwrap();
    assert!(result.matched);
    assert_eq!(result.employee_id.as_deref(), Some("e1"));

    // First badge of the day is a clock-in.
    let now = Utc::now();
    let entries = store.load_entries("acme").unwrap();
    let recorded = timesheet::recorded_today(&entries, "e1", now);
    let next = timesheet::next_record_type(&recorded).unwrap();
    assert_eq!(next, timesheet::RecordType::ClockIn);

    store
        .append_entry(
            "acme",
            TimeEntry {
                id: uuid::Uuid::new_v4().to_string(),
                employee_id: "e1".to_string(),
                record_type: next,
                timestamp: now,
                device_id: "kiosk-1".to_string(),
                similarity: result.similarity,
            },
        )
        .unwrap();

    // Second badge advances to lunch-out.
    let entries = store.load_entries("acme").unwrap();
    let recorded = timesheet::recorded_today(&entries, "e1", now);
    assert_eq!(
        timesheet::next_record_type(&recorded),
        Some(timesheet::RecordType::LunchStart)
    );
}

#[test]
fn cleared_employee_no_longer_matches() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path());

    store
        .save_enrollment("acme", enrollment("e1", "Ana", unit_at(0.97, 64)))
        .unwrap();
    store.clear_employee("acme", "e1").unwrap();

    let pool = store.load_enrollments("acme").unwrap();
    let result = find_best_match(&axis(64), &pool, 0.90).unwrap();
    assert!(!result.matched);
    assert_eq!(result.similarity, -1.0);
    assert!(result.message.unwrap().contains("No biometrics"));
}

#[test]
fn re_enrolled_employee_matches_on_best_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path());

    // Re-enrollment over time leaves several records; all stay candidates.
    store
        .save_enrollment("acme", enrollment("e1", "Ana", unit_at(0.91, 256)))
        .unwrap();
    store
        .save_enrollment("acme", enrollment("e1", "Ana", unit_at(0.96, 256)))
        .unwrap();

    let pool = store.load_enrollments("acme").unwrap();
    let result = find_best_match(&axis(256), &pool, 0.90).unwrap();
    assert!(result.matched);
    assert!(!result.ambiguous);
    assert!((result.similarity - 0.96).abs() < 1e-3);
}

#[test]
fn mixed_dimension_pool_still_matches() {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(dir.path());

    // A legacy enrollment captured by an older 128-d model sits alongside a
    // current 512-d one; the stale record is skipped, not fatal.
    store
        .save_enrollment("acme", enrollment("e1", "Ana", unit_at(0.99, 128)))
        .unwrap();
    store
        .save_enrollment("acme", enrollment("e1", "Ana", unit_at(0.95, 512)))
        .unwrap();

    let pool = store.load_enrollments("acme").unwrap();
    let result = find_best_match(&axis(512), &pool, 0.90).unwrap();
    assert!(result.matched);
    assert!((result.similarity - 0.95).abs() < 1e-3);
}
