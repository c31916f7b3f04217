//! Staff directory model.
//!
//! Staff are organized into groups ("kitchen", "hall", ...), each owning an
//! ordered list of members. Rule assignments address members *positionally*
//! (group id + index into the current member list), so the order of a
//! group's members is part of the rota's meaning.
//!
//! # Positional references
//! Moving or removing a member shifts the index of every member after it.
//! Rules and already-fixed weeks are not rewritten: they resolve against the
//! current list at derivation time, so such edits change historical output.

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, PlanError};

/// Staff group identifier (unique within a plan).
pub type GroupId = u64;
/// Staff member identifier (unique within a plan).
pub type MemberId = u64;

/// A single member of a staff group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    /// Member identifier.
    pub id: MemberId,
    /// Name shown in derived shifts.
    pub display_name: String,
    /// Persisted ordering key; list position is the rule index.
    pub sort_order: i64,
}

/// A named group owning an ordered list of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffGroup {
    /// Group identifier.
    pub id: GroupId,
    /// Group name (e.g., "kitchen").
    pub name: String,
    /// Persisted ordering key among groups.
    pub sort_order: i64,
    /// Members in positional order.
    pub members: Vec<StaffMember>,
}

impl StaffGroup {
    /// Creates an empty group.
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sort_order: 0,
            members: Vec::new(),
        }
    }

    /// Sets the ordering key.
    pub fn with_sort_order(mut self, sort_order: i64) -> Self {
        self.sort_order = sort_order;
        self
    }

    /// Appends a member.
    pub fn with_member(mut self, id: MemberId, display_name: impl Into<String>) -> Self {
        let sort_order = self.next_member_order();
        self.members.push(StaffMember {
            id,
            display_name: display_name.into(),
            sort_order,
        });
        self
    }

    /// Member at a rule index, if any.
    #[inline]
    pub fn member_at(&self, index: usize) -> Option<&StaffMember> {
        self.members.get(index)
    }

    /// Position of a member in this group.
    pub fn position_of(&self, member_id: MemberId) -> Option<usize> {
        self.members.iter().position(|m| m.id == member_id)
    }

    fn next_member_order(&self) -> i64 {
        self.members
            .iter()
            .map(|m| m.sort_order)
            .max()
            .map_or(0, |o| o + 1)
    }

    fn renumber(&mut self) {
        for (i, m) in self.members.iter_mut().enumerate() {
            m.sort_order = i as i64;
        }
    }
}

/// Registry of staff groups and their members.
///
/// Ids are allocated by the directory and never reused, even after removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffDirectory {
    groups: Vec<StaffGroup>,
    next_group_id: GroupId,
    next_member_id: MemberId,
}

impl StaffDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a directory from persisted groups.
    ///
    /// Groups and members are ordered by `sort_order`; id counters resume
    /// past the highest id seen.
    pub fn from_groups(mut groups: Vec<StaffGroup>) -> Result<Self, ImportError> {
        let mut group_ids = std::collections::HashSet::new();
        let mut member_ids = std::collections::HashSet::new();
        for g in &groups {
            if !group_ids.insert(g.id) {
                return Err(ImportError::DuplicateId {
                    kind: "group",
                    id: g.id,
                });
            }
            for m in &g.members {
                if !member_ids.insert(m.id) {
                    return Err(ImportError::DuplicateId {
                        kind: "member",
                        id: m.id,
                    });
                }
            }
        }

        groups.sort_by_key(|g| g.sort_order);
        for g in &mut groups {
            g.members.sort_by_key(|m| m.sort_order);
        }

        Ok(Self {
            next_group_id: group_ids.iter().max().map_or(1, |id| id + 1),
            next_member_id: member_ids.iter().max().map_or(1, |id| id + 1),
            groups,
        })
    }

    /// All groups in display order.
    pub fn groups(&self) -> &[StaffGroup] {
        &self.groups
    }

    /// Looks up a group by id.
    pub fn group(&self, group_id: GroupId) -> Option<&StaffGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    /// Resolves a positional rule reference to a member.
    ///
    /// Returns `None` for a deleted group or an index past the end.
    pub fn resolve(&self, group_id: GroupId, member_index: usize) -> Option<&StaffMember> {
        self.group(group_id)?.member_at(member_index)
    }

    /// Adds a group at the end of the list.
    pub fn add_group(&mut self, name: impl Into<String>) -> Result<GroupId, PlanError> {
        let name = non_empty(name.into(), "group")?;
        let id = self.alloc_group_id();
        let sort_order = self
            .groups
            .iter()
            .map(|g| g.sort_order)
            .max()
            .map_or(0, |o| o + 1);
        self.groups
            .push(StaffGroup::new(id, name).with_sort_order(sort_order));
        Ok(id)
    }

    /// Removes a group and its members.
    ///
    /// Rule assignments pointing at the group are left dangling.
    pub fn remove_group(&mut self, group_id: GroupId) -> Result<StaffGroup, PlanError> {
        let pos = self
            .groups
            .iter()
            .position(|g| g.id == group_id)
            .ok_or(PlanError::UnknownGroup(group_id))?;
        Ok(self.groups.remove(pos))
    }

    /// Renames a group.
    pub fn rename_group(
        &mut self,
        group_id: GroupId,
        name: impl Into<String>,
    ) -> Result<(), PlanError> {
        let name = non_empty(name.into(), "group")?;
        self.group_mut(group_id)?.name = name;
        Ok(())
    }

    /// Appends a member to a group; its rule index is the old member count.
    pub fn add_member(
        &mut self,
        group_id: GroupId,
        display_name: impl Into<String>,
    ) -> Result<MemberId, PlanError> {
        let display_name = non_empty(display_name.into(), "member")?;
        // Check the group before consuming an id.
        self.group_mut(group_id)?;
        let id = self.alloc_member_id();
        let group = self.group_mut(group_id)?;
        let sort_order = group.next_member_order();
        group.members.push(StaffMember {
            id,
            display_name,
            sort_order,
        });
        Ok(id)
    }

    /// Removes a member; later members move up one index.
    pub fn remove_member(&mut self, member_id: MemberId) -> Result<StaffMember, PlanError> {
        for group in &mut self.groups {
            if let Some(pos) = group.position_of(member_id) {
                return Ok(group.members.remove(pos));
            }
        }
        Err(PlanError::UnknownMember(member_id))
    }

    /// Renames a member. Fixed weeks show the new name on next derivation.
    pub fn rename_member(
        &mut self,
        member_id: MemberId,
        display_name: impl Into<String>,
    ) -> Result<(), PlanError> {
        let display_name = non_empty(display_name.into(), "member")?;
        let member = self
            .groups
            .iter_mut()
            .flat_map(|g| g.members.iter_mut())
            .find(|m| m.id == member_id)
            .ok_or(PlanError::UnknownMember(member_id))?;
        member.display_name = display_name;
        Ok(())
    }

    /// Moves a member to another position within its group.
    ///
    /// This re-targets every rule index between `from` and `to`,
    /// including those of already-fixed weeks.
    pub fn move_member(
        &mut self,
        group_id: GroupId,
        from: usize,
        to: usize,
    ) -> Result<(), PlanError> {
        let group = self.group_mut(group_id)?;
        let len = group.members.len();
        for index in [from, to] {
            if index >= len {
                return Err(PlanError::IndexOutOfRange { index, len });
            }
        }
        let member = group.members.remove(from);
        group.members.insert(to, member);
        group.renumber();
        Ok(())
    }

    fn group_mut(&mut self, group_id: GroupId) -> Result<&mut StaffGroup, PlanError> {
        self.groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or(PlanError::UnknownGroup(group_id))
    }

    fn alloc_group_id(&mut self) -> GroupId {
        self.next_group_id = self.next_group_id.max(1);
        let id = self.next_group_id;
        self.next_group_id += 1;
        id
    }

    fn alloc_member_id(&mut self) -> MemberId {
        self.next_member_id = self.next_member_id.max(1);
        let id = self.next_member_id;
        self.next_member_id += 1;
        id
    }
}

pub(crate) fn non_empty(name: String, what: &'static str) -> Result<String, PlanError> {
    if name.trim().is_empty() {
        Err(PlanError::EmptyName(what))
    } else {
        Ok(name)
    }
}
