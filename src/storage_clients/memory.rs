use crate::error::AppError;
use crate::storage::{DeleteStatus, ObjectStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-process object store. `set_unavailable(true)` makes every call fail like an
/// unreachable endpoint.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    unavailable: AtomicBool,
    gets: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().contains_key(path)
    }

    /// Number of `get` calls served or refused so far.
    pub fn get_calls(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Unavailable("memory object store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn exists(&self, path: &str) -> Result<bool, AppError> {
        self.check_available()?;
        Ok(self.lock().contains_key(path))
    }

    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<(), AppError> {
        self.check_available()?;
        self.lock().insert(path.to_string(), bytes);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, AppError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| AppError::NotFound(path.to_string()))
    }

    async fn delete(&self, paths: &[String]) -> Result<DeleteStatus, AppError> {
        self.check_available()?;
        let mut objects = self.lock();
        for path in paths {
            objects.remove(path);
        }
        Ok(DeleteStatus {
            status_code: 200,
            deleted: paths.len(),
            failed: Vec::new(),
        })
    }
}
