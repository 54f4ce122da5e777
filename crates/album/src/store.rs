use crate::timeline::{group_by_year, YearGroup};
use crate::{
    AlbumError, AlbumInfo, Memory, MemoryDraft, MemoryId, MemoryUpdate, RecordStore, Result,
    ALBUM_INFO_KEY, JUST_CREATED_KEY, MEMORIES_KEY,
};

/// The album held in memory and mirrored to a `RecordStore`
///
/// `open` loads everything once; every mutation writes the full memory list
/// back before the in-memory copy changes, so a failed write leaves both
/// sides as they were. `create_album` writes the list before the info and
/// restores the previous records if a later write fails.
pub struct AlbumStore<S> {
    store: S,
    info: Option<AlbumInfo>,
    memories: Vec<Memory>,
}

impl<S: RecordStore> AlbumStore<S> {
    pub fn open(store: S) -> Result<Self> {
        let info = match store.get(ALBUM_INFO_KEY)? {
            Some(raw) => Some(serde_json::from_str::<AlbumInfo>(&raw)?),
            None => None,
        };
        let memories = match store.get(MEMORIES_KEY)? {
            Some(raw) => serde_json::from_str::<Vec<Memory>>(&raw)?,
            None => Vec::new(),
        };
        tracing::info!(
            memories = memories.len(),
            has_album = info.is_some(),
            "album loaded"
        );
        Ok(Self {
            store,
            info,
            memories,
        })
    }

    pub fn record_store(&self) -> &S {
        &self.store
    }

    pub fn is_created(&self) -> bool {
        self.info.is_some()
    }

    pub fn info(&self) -> Option<&AlbumInfo> {
        self.info.as_ref()
    }

    pub fn greeting(&self) -> Option<String> {
        self.info.as_ref().map(AlbumInfo::greeting)
    }

    /// Create (or recreate) the album, replacing any previous memories.
    pub fn create_album(&mut self, info: AlbumInfo, drafts: Vec<MemoryDraft>) -> Result<&[Memory]> {
        info.validate()?;
        if drafts.is_empty() {
            return Err(AlbumError::Validation(
                "Kam se kam ek yaad honi chahiye.".to_string(),
            ));
        }
        for draft in &drafts {
            draft.validate()?;
        }

        let mut memories: Vec<Memory> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let mut memory = Memory::from_draft(draft);
            while memories.iter().any(|m| m.id == memory.id) {
                memory.id = MemoryId::new();
            }
            memories.push(memory);
        }

        let info_json = serde_json::to_string(&info)?;
        let previous_info = self.store.get(ALBUM_INFO_KEY)?;
        self.persist(&memories)?;
        let written = self
            .store
            .put(ALBUM_INFO_KEY, &info_json)
            .and_then(|_| self.store.put(JUST_CREATED_KEY, "true"));
        if let Err(err) = written {
            self.restore(previous_info.as_deref());
            return Err(err.into());
        }

        tracing::info!(
            creator = %info.creator_name,
            memories = memories.len(),
            "album created"
        );
        self.info = Some(info);
        self.memories = memories;
        Ok(&self.memories)
    }

    /// True exactly once after `create_album`.
    pub fn take_just_created(&mut self) -> Result<bool> {
        let flag = self.store.get(JUST_CREATED_KEY)?;
        if flag.is_some() {
            self.store.delete(JUST_CREATED_KEY)?;
        }
        Ok(flag.as_deref() == Some("true"))
    }

    pub fn memories(&self) -> &[Memory] {
        &self.memories
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Memory> {
        self.memories.iter().find(|m| m.id.as_str() == id)
    }

    pub fn add(&mut self, draft: MemoryDraft) -> Result<Memory> {
        draft.validate()?;
        let mut memory = Memory::from_draft(draft);
        while self.memories.iter().any(|m| m.id == memory.id) {
            memory.id = MemoryId::new();
        }

        let mut next = self.memories.clone();
        next.push(memory.clone());
        self.persist(&next)?;
        self.memories = next;

        tracing::debug!(id = %memory.id, "memory added");
        Ok(memory)
    }

    pub fn update(&mut self, id: &str, update: MemoryUpdate) -> Result<Memory> {
        update.validate()?;
        let idx = self.index_of(id)?;

        let mut next = self.memories.clone();
        next[idx].apply(update);
        let updated = next[idx].clone();
        self.persist(&next)?;
        self.memories = next;

        tracing::debug!(id = %updated.id, "memory updated");
        Ok(updated)
    }

    /// Replace only the caption; used after a wish is generated.
    pub fn set_wish(&mut self, id: &str, wish: impl Into<String>) -> Result<Memory> {
        let idx = self.index_of(id)?;
        let mut next = self.memories.clone();
        next[idx].wish = wish.into();
        let updated = next[idx].clone();
        self.persist(&next)?;
        self.memories = next;
        Ok(updated)
    }

    pub fn remove(&mut self, id: &str) -> Result<Memory> {
        let idx = self.index_of(id)?;

        let mut next = self.memories.clone();
        let removed = next.remove(idx);
        self.persist(&next)?;
        self.memories = next;

        tracing::debug!(id = %removed.id, "memory removed");
        Ok(removed)
    }

    pub fn timeline(&self) -> Vec<YearGroup> {
        group_by_year(&self.memories)
    }

    /// Write the current list again.
    pub fn flush(&self) -> Result<()> {
        self.persist(&self.memories)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.memories
            .iter()
            .position(|m| m.id.as_str() == id)
            .ok_or_else(|| AlbumError::NotFound(id.to_string()))
    }

    /// Put back the records a failed `create_album` may have replaced.
    fn restore(&self, previous_info: Option<&str>) {
        let info = match previous_info {
            Some(raw) => self.store.put(ALBUM_INFO_KEY, raw),
            None => self.store.delete(ALBUM_INFO_KEY),
        };
        if let Err(err) = info {
            tracing::error!(error = %err, "could not restore album info after failed create");
        }
        if let Err(err) = self.persist(&self.memories) {
            tracing::error!(error = %err, "could not restore memories after failed create");
        }
    }

    fn persist(&self, memories: &[Memory]) -> Result<()> {
        let json = serde_json::to_string(memories)?;
        self.store.put(MEMORIES_KEY, &json)?;
        Ok(())
    }
}
