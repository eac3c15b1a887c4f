use crate::domain::payment::Id;
use crate::domain::ports::FileStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Serves `<root>/<id>.pdf` files.
#[derive(Debug, Clone)]
pub struct DirectoryFileStore {
    root: PathBuf,
}

impl DirectoryFileStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(PaymentError::ValidationError(format!(
                "files directory {} does not exist",
                root.display()
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path(&self, id: &Id) -> Result<PathBuf> {
        let name = format!("{id}.pdf");
        let mut components = Path::new(&name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(name)),
            _ => Err(PaymentError::ValidationError(format!(
                "payment id {id:?} is not a file name"
            ))),
        }
    }
}

#[async_trait]
impl FileStore for DirectoryFileStore {
    async fn get_data(&self, id: &Id) -> Result<Vec<u8>> {
        let path = self.path(id)?;
        tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => PaymentError::NotFound(format!("file for payment {id}")),
            _ => PaymentError::StorageError(format!("cannot read {}: {e}", path.display())),
        })
    }
}
