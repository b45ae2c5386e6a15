use chrono::{TimeZone, Utc};
use dueline::persistence::{load_tasks, TASKS_KEY};
use dueline::{BlobStore, Database, SortCriterion, TaskFields, TaskStore};
use tempfile::TempDir;

#[test]
fn tasks_survive_reopening_the_database() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("tasks.db");

    let created_id = {
        let mut store = TaskStore::load(Database::new(&path).unwrap());
        let task = store
            .create(TaskFields::new("Renew passport", "bring photos", "2030-05-01", "09:30"))
            .unwrap();
        store.toggle_completion(task.id).unwrap();
        task.id
    };

    let store = TaskStore::load(Database::new(&path).unwrap());
    assert_eq!(store.len(), 1);
    let task = store.get(created_id).unwrap();
    assert_eq!(task.title, "Renew passport");
    assert_eq!(task.description, "bring photos");
    assert!(task.completed);
}

#[test]
fn corrupt_blob_loads_as_empty_and_is_overwritten_on_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.db");
    let db = Database::new(&path).unwrap();
    db.set(TASKS_KEY, "{not json").unwrap();
    assert!(load_tasks(&db).is_empty());

    let mut store = TaskStore::load(db);
    assert!(store.is_empty());
    store
        .create(TaskFields::new("Fresh start", "", "2030-01-01", "08:00"))
        .unwrap();

    let reopened = Database::new(&path).unwrap();
    assert_eq!(load_tasks(&reopened).len(), 1);
}

#[test]
fn ids_stay_unique_across_sessions() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.db");
    let now = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();

    let first = {
        let mut store = TaskStore::load(Database::new(&path).unwrap());
        store
            .create_at(TaskFields::new("a", "", "2030-01-02", "10:00"), now)
            .unwrap()
            .id
    };

    // Same clock reading in a later session
    let mut store = TaskStore::load(Database::new(&path).unwrap());
    let second = store
        .create_at(TaskFields::new("b", "", "2030-01-03", "10:00"), now)
        .unwrap()
        .id;
    assert!(second > first);
}

#[test]
fn reopening_sorts_by_date_regardless_of_last_sort() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.db");

    {
        let mut store = TaskStore::load(Database::new(&path).unwrap());
        store
            .create(TaskFields::new("zebra", "", "2030-01-01", "08:00"))
            .unwrap();
        store
            .create(TaskFields::new("Aardvark", "", "2030-02-01", "08:00"))
            .unwrap();
        store.sort_by(SortCriterion::Title);
        // Any mutation writes the collection in its current order
        store
            .create(TaskFields::new("middle", "", "2029-06-01", "08:00"))
            .unwrap();
    }

    let stored: Vec<String> = load_tasks(&Database::new(&path).unwrap())
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert_eq!(stored, vec!["Aardvark", "zebra", "middle"]);

    let store = TaskStore::load(Database::new(&path).unwrap());
    let titles: Vec<&str> = store.list().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["middle", "zebra", "Aardvark"]);
}
