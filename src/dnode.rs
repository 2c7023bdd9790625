//! Directory nodes handed out by lookup and iteration.

use crate::catalog::CatalogRecord;
use crate::link::LinkKind;
use crate::ExtentRecord;
use hfs_types_rs::{
    BsdInfoFileModeFlag, CatalogNodeId, DateTime, HFS_TO_POSIX_EPOCH_OFFSET, OsType,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnodeKind {
    File,
    Directory,
    /// Symbolic link or hard link; see [`Dnode::link_kind`].
    Symlink,
    Unknown,
}

/// A file, folder or link found in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dnode {
    pub id: CatalogNodeId,
    pub parent_id: CatalogNodeId,
    /// UTF-16 name as stored in the catalog key.
    pub name: Vec<u16>,
    pub kind: DnodeKind,
    /// Logical size of the data fork.
    pub size: u64,
    pub extents: ExtentRecord,
    pub create_time: DateTime,
    pub modify_time: DateTime,
    pub access_time: DateTime,
    pub file_type: OsType,
    pub file_creator: OsType,
    /// Inode number of a hard link's target.
    pub inode_num: u32,
}

impl Dnode {
    fn empty(id: CatalogNodeId, parent_id: CatalogNodeId, name: Vec<u16>, kind: DnodeKind) -> Self {
        Self {
            id,
            parent_id,
            name,
            kind,
            size: 0,
            extents: ExtentRecord::default(),
            create_time: 0,
            modify_time: 0,
            access_time: 0,
            file_type: 0,
            file_creator: 0,
            inode_num: 0,
        }
    }

    /// Dnode for the volume's root folder.
    pub fn root() -> Self {
        Self::empty(
            hfs_types_rs::SpecialFileCatalogNodeId::RootFolder.into(),
            hfs_types_rs::SpecialFileCatalogNodeId::RootParent.into(),
            Vec::new(),
            DnodeKind::Directory,
        )
    }

    /// Classify a catalog record found under `parent_id` with `name`.
    ///
    /// Thread records and unknown record types become [`DnodeKind::Unknown`]
    /// with ID 0 and no attributes.
    pub fn from_record(parent_id: CatalogNodeId, name: Vec<u16>, record: &CatalogRecord) -> Self {
        match record {
            CatalogRecord::Folder(folder) => {
                let mut dnode = Self::empty(folder.folder_id, parent_id, name, DnodeKind::Directory);
                dnode.create_time = folder.create_date;
                dnode.modify_time = folder.content_mod_date;
                dnode.access_time = folder.access_date;
                dnode
            }
            CatalogRecord::File(file) => {
                let mut dnode = Self::empty(file.file_id, parent_id, name, DnodeKind::File);
                dnode.size = file.data_fork.logical_size;
                dnode.extents = file.data_fork.extents;
                dnode.create_time = file.create_date;
                dnode.modify_time = file.content_mod_date;
                dnode.access_time = file.access_date;
                dnode.file_type = file.user_info.file_type;
                dnode.file_creator = file.user_info.file_creator;

                if dnode.link_kind().is_some() {
                    dnode.kind = DnodeKind::Symlink;
                    dnode.inode_num = file.permissions.special;
                }
                dnode
            }
            CatalogRecord::FolderThread(_)
            | CatalogRecord::FileThread(_)
            | CatalogRecord::Unknown(_) => Self::empty(0, parent_id, name, DnodeKind::Unknown),
        }
    }

    pub fn link_kind(&self) -> Option<LinkKind> {
        LinkKind::detect(self.file_type, self.file_creator)
    }

    pub fn name_lossy(&self) -> String {
        String::from_utf16_lossy(&self.name)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == DnodeKind::Directory
    }
}

/// POSIX view of a dnode's attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnodeStat {
    pub used_bytes: u64,
    pub mode: u16,
    pub ctime: u32,
    pub mtime: u32,
    pub atime: u32,
}

/// Everything on the volume is read-only: `r-x------`.
pub const READ_ONLY_MODE: u16 =
    BsdInfoFileModeFlag::OwnerRead.bits() | BsdInfoFileModeFlag::OwnerExecute.bits();

impl From<&Dnode> for DnodeStat {
    fn from(dnode: &Dnode) -> Self {
        Self {
            used_bytes: dnode.size,
            mode: READ_ONLY_MODE,
            ctime: posix_time(dnode.create_time),
            mtime: posix_time(dnode.modify_time),
            atime: posix_time(dnode.access_time),
        }
    }
}

/// Convert seconds since 1904 to seconds since 1970, clamping earlier dates to 0.
pub fn posix_time(hfs_time: DateTime) -> u32 {
    hfs_time.saturating_sub(HFS_TO_POSIX_EPOCH_OFFSET)
}
