use progress_core::model::{Metric, ProgressVector, Role, UserId};
use progress_core::project;
use progress_core::time::fixed_now;
use storage::repository::{
    CommitBatch, ProgressPersistence, ProgressRepository, RecordWrite, Storage, StorageError,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn one_slot(slot: usize) -> ProgressVector {
    project(1.0, &[1.0], &[slot], &ProgressVector::zeroed())
}

#[tokio::test]
async fn sqlite_ensure_record_roundtrip() {
    let repo = connect("memdb_progress_roundtrip").await;
    let user = UserId::new(7);

    let created = repo
        .ensure_record(user, Role::Student, fixed_now())
        .await
        .unwrap();
    assert_eq!(created.version, 0);
    assert_eq!(created.vector, ProgressVector::zeroed());
    assert!(created.metrics.is_empty());
    assert_eq!(created.updated_at, fixed_now());

    let again = repo
        .ensure_record(user, Role::Student, fixed_now())
        .await
        .unwrap();
    assert_eq!(again, created);

    assert!(matches!(
        repo.load_record(user, Role::Tutor).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn sqlite_commit_persists_vectors_and_increments() {
    let repo = connect("memdb_progress_commit").await;
    let student = UserId::new(1);
    let tutor = UserId::new(2);
    repo.ensure_record(student, Role::Student, fixed_now())
        .await
        .unwrap();
    repo.ensure_record(tutor, Role::Tutor, fixed_now())
        .await
        .unwrap();

    let batch = CommitBatch {
        writes: vec![
            RecordWrite {
                user_id: student,
                role: Role::Student,
                expected_version: 0,
                vector: one_slot(0),
                increments: vec![(Metric::RequestsSent, 1.0), (Metric::StudentPoints, 0.1)],
            },
            RecordWrite {
                user_id: tutor,
                role: Role::Tutor,
                expected_version: 0,
                vector: one_slot(1),
                increments: vec![(Metric::RequestsReceived, 1.0)],
            },
        ],
        committed_at: fixed_now(),
    };
    repo.commit(&batch).await.unwrap();
    repo.commit(&CommitBatch {
        writes: vec![RecordWrite {
            expected_version: 1,
            increments: vec![(Metric::RequestsSent, 2.0)],
            ..batch.writes[0].clone()
        }],
        committed_at: fixed_now(),
    })
    .await
    .unwrap();

    let record = repo.load_record(student, Role::Student).await.unwrap();
    assert_eq!(record.version, 2);
    assert_eq!(record.vector, one_slot(0));
    assert_eq!(record.metrics.get(Metric::RequestsSent), 3.0);
    assert_eq!(record.metrics.get(Metric::StudentPoints), 0.1);

    assert_eq!(
        repo.load_metric(tutor, Metric::RequestsReceived).await.unwrap(),
        1.0
    );
    assert_eq!(repo.load_vector(tutor, Role::Tutor).await.unwrap(), one_slot(1));
}

#[tokio::test]
async fn sqlite_conflict_rolls_back_whole_batch() {
    let repo = connect("memdb_progress_conflict").await;
    let student = UserId::new(1);
    let tutor = UserId::new(2);
    repo.ensure_record(student, Role::Student, fixed_now())
        .await
        .unwrap();
    repo.ensure_record(tutor, Role::Tutor, fixed_now())
        .await
        .unwrap();
    let bumped = repo
        .save_vector(tutor, Role::Tutor, &ProgressVector::zeroed(), 0, fixed_now())
        .await
        .unwrap();
    assert_eq!(bumped, 1);

    let err = repo
        .commit(&CommitBatch {
            writes: vec![
                RecordWrite {
                    user_id: student,
                    role: Role::Student,
                    expected_version: 0,
                    vector: one_slot(0),
                    increments: vec![(Metric::RequestsSent, 1.0)],
                },
                RecordWrite {
                    user_id: tutor,
                    role: Role::Tutor,
                    expected_version: 0,
                    vector: one_slot(1),
                    increments: vec![(Metric::RequestsReceived, 1.0)],
                },
            ],
            committed_at: fixed_now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let record = repo.load_record(student, Role::Student).await.unwrap();
    assert_eq!(record.version, 0);
    assert_eq!(record.vector, ProgressVector::zeroed());
    assert_eq!(record.metrics.get(Metric::RequestsSent), 0.0);
}

#[tokio::test]
async fn sqlite_missing_record_is_not_found_on_write() {
    let repo = connect("memdb_progress_missing").await;
    let err = repo
        .commit(&CommitBatch {
            writes: vec![RecordWrite {
                user_id: UserId::new(99),
                role: Role::Tutor,
                expected_version: 0,
                vector: one_slot(0),
                increments: Vec::new(),
            }],
            committed_at: fixed_now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn storage_sqlite_wires_both_ports() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_storage?mode=memory&cache=shared")
        .await
        .expect("storage");
    let record = storage
        .records
        .ensure_record(UserId::new(3), Role::Tutor, fixed_now())
        .await
        .unwrap();
    let version = storage
        .commits
        .save_vector(UserId::new(3), Role::Tutor, &one_slot(27), record.version, fixed_now())
        .await
        .unwrap();
    assert_eq!(version, 1);
    assert_eq!(
        storage
            .records
            .load_vector(UserId::new(3), Role::Tutor)
            .await
            .unwrap(),
        one_slot(27)
    );
}
