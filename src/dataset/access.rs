use crate::dataset::{EncodeDataset, FeatureList, GenomicDataset, SortVector, UserDataset};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Subject {
    pub user_id: Option<u64>,
    pub staff: bool,
}

impl Subject {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(id: u64) -> Self {
        Self {
            user_id: Some(id),
            staff: false,
        }
    }

    pub fn staff(id: u64) -> Self {
        Self {
            user_id: Some(id),
            staff: true,
        }
    }
}

pub trait Owned {
    fn owner(&self) -> Option<u64>;
    fn is_public(&self) -> bool;
}

pub fn can_view<R: Owned + ?Sized>(subject: &Subject, resource: &R) -> bool {
    if resource.is_public() || subject.staff {
        return true;
    }
    match (subject.user_id, resource.owner()) {
        (Some(user), Some(owner)) => user == owner,
        _ => false,
    }
}

impl Owned for UserDataset {
    fn owner(&self) -> Option<u64> {
        self.owner
    }

    fn is_public(&self) -> bool {
        self.public
    }
}

// Encode data is a shared read-only reference store.
impl Owned for EncodeDataset {
    fn owner(&self) -> Option<u64> {
        None
    }

    fn is_public(&self) -> bool {
        true
    }
}

impl Owned for GenomicDataset {
    fn owner(&self) -> Option<u64> {
        match self {
            Self::User(d) => d.owner(),
            Self::Encode(d) => d.owner(),
        }
    }

    fn is_public(&self) -> bool {
        match self {
            Self::User(d) => d.is_public(),
            Self::Encode(d) => d.is_public(),
        }
    }
}

impl Owned for FeatureList {
    fn owner(&self) -> Option<u64> {
        self.owner
    }

    fn is_public(&self) -> bool {
        self.public
    }
}

impl Owned for SortVector {
    fn owner(&self) -> Option<u64> {
        self.owner
    }

    fn is_public(&self) -> bool {
        self.public
    }
}
