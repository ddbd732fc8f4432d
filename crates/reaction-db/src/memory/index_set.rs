//! In-process realization of the four reaction indexes
//!
//! - `identity` is `idx_unique_post_user_reaction` and the only source of truth.
//! - `posts` holds `idx_post_reactions_timeline` and `idx_post_reaction_type`
//!   together under one per-post entry, so a count and its grouping are always
//!   read from the same state.
//! - `users` is `idx_user_reactions_timeline`.
//!
//! Locks are always taken identity entry first, then at most one post or user
//! entry at a time. Nothing acquires an identity entry while holding a post or
//! user entry, so writers cannot deadlock. Rebuilds and consistency checks
//! copy derived entries out before consulting identity, so they never hold
//! more than one entry either and run alongside readers and writers.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use reaction_core::{Reaction, ReactionKey, ReactionType, Snowflake, TimelineCursor};

/// Ascending iteration over `Reverse` keys walks a timeline newest first,
/// ties broken by descending record id
type TimelineKey = Reverse<(DateTime<Utc>, Snowflake)>;

type Timeline = BTreeMap<TimelineKey, Reaction>;

fn timeline_key(reaction: &Reaction) -> TimelineKey {
    Reverse((reaction.created_at, reaction.id))
}

fn page(timeline: &Timeline, after: Option<TimelineCursor>, limit: usize) -> Vec<Reaction> {
    match after {
        Some(cursor) => timeline
            .range((Excluded(Reverse((cursor.created_at, cursor.id))), Unbounded))
            .take(limit)
            .map(|(_, r)| r.clone())
            .collect(),
        None => timeline.values().take(limit).cloned().collect(),
    }
}

#[derive(Debug, Default)]
struct PostEntry {
    timeline: Timeline,
    by_type: BTreeMap<ReactionType, Timeline>,
}

impl PostEntry {
    fn attach(&mut self, reaction: &Reaction) {
        let key = timeline_key(reaction);
        self.timeline.insert(key, reaction.clone());
        self.by_type
            .entry(reaction.reaction_type.clone())
            .or_default()
            .insert(key, reaction.clone());
    }

    fn detach(&mut self, reaction: &Reaction) {
        let key = timeline_key(reaction);
        self.timeline.remove(&key);
        if let Some(group) = self.by_type.get_mut(&reaction.reaction_type) {
            group.remove(&key);
            if group.is_empty() {
                self.by_type.remove(&reaction.reaction_type);
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Empty in every part, grouping included
    fn is_unused(&self) -> bool {
        self.timeline.is_empty() && self.by_type.is_empty()
    }
}

/// One place a record can sit outside the unique index, with the id of the
/// post or user whose entry holds it
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    PostTimeline(Snowflake),
    PostGroup(Snowflake, ReactionType),
    UserTimeline(Snowflake),
}

impl Slot {
    /// Whether `record` belongs where this slot files it
    fn fits(&self, record: &Reaction) -> bool {
        match self {
            Self::PostTimeline(post_id) => *post_id == record.post_id,
            Self::PostGroup(post_id, reaction_type) => {
                *post_id == record.post_id && *reaction_type == record.reaction_type
            }
            Self::UserTimeline(user_id) => *user_id == record.user_id,
        }
    }
}

/// Concurrent index set over reaction records
#[derive(Debug, Default)]
pub struct IndexSet {
    identity: DashMap<ReactionKey, Reaction>,
    posts: DashMap<Snowflake, PostEntry>,
    users: DashMap<Snowflake, Timeline>,
}

impl IndexSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held by the unique index
    pub fn len(&self) -> usize {
        self.identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identity.is_empty()
    }

    pub fn get(&self, key: &ReactionKey) -> Option<Reaction> {
        self.identity.get(key).map(|r| r.value().clone())
    }

    /// Conditional insert through the unique index. Returns `false`, leaving
    /// every index untouched, when the key is already held.
    pub fn insert(&self, reaction: &Reaction) -> bool {
        match self.identity.entry(reaction.key()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                self.attach(reaction);
                slot.insert(reaction.clone());
                true
            }
        }
    }

    /// Overwrite the mutable fields of the record holding `reaction`'s key,
    /// provided it is still the record with `reaction.id`. Returns the stored
    /// record, or `None` when the key is free or held by a newer record.
    pub fn replace(&self, reaction: &Reaction) -> Option<Reaction> {
        let mut current = self.identity.get_mut(&reaction.key())?;
        if current.id != reaction.id {
            return None;
        }

        let stored = Reaction {
            id: current.id,
            post_id: current.post_id,
            user_id: current.user_id,
            reaction_type: reaction.reaction_type.clone(),
            created_at: reaction.created_at,
            updated_at: reaction.updated_at,
        };

        if let Some(mut post) = self.posts.get_mut(&stored.post_id) {
            post.detach(&current);
            post.attach(&stored);
        }
        if let Some(mut user) = self.users.get_mut(&stored.user_id) {
            user.remove(&timeline_key(&current));
            user.insert(timeline_key(&stored), stored.clone());
        }

        *current = stored.clone();
        Some(stored)
    }

    /// Remove the record for `key` from every index
    pub fn remove(&self, key: &ReactionKey) -> Option<Reaction> {
        match self.identity.entry(*key) {
            Entry::Vacant(_) => None,
            Entry::Occupied(slot) => {
                self.detach(slot.get());
                Some(slot.remove())
            }
        }
    }

    /// Remove every record on the given posts; returns how many were removed.
    /// Records inserted on those posts while the call runs may survive it.
    pub fn remove_posts(&self, post_ids: &[Snowflake]) -> u64 {
        let mut removed = 0;
        for post_id in post_ids {
            let users: Vec<Snowflake> = match self.posts.get(post_id) {
                Some(post) => post.timeline.values().map(|r| r.user_id).collect(),
                None => continue,
            };
            for user_id in users {
                if self.remove(&ReactionKey::new(*post_id, user_id)).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    pub fn post_timeline(
        &self,
        post_id: Snowflake,
        after: Option<TimelineCursor>,
        limit: usize,
    ) -> Vec<Reaction> {
        self.posts
            .get(&post_id)
            .map(|post| page(&post.timeline, after, limit))
            .unwrap_or_default()
    }

    pub fn user_timeline(
        &self,
        user_id: Snowflake,
        after: Option<TimelineCursor>,
        limit: usize,
    ) -> Vec<Reaction> {
        self.users
            .get(&user_id)
            .map(|timeline| page(&timeline, after, limit))
            .unwrap_or_default()
    }

    /// Newest records of one type; touches only that type's group
    pub fn type_group(
        &self,
        post_id: Snowflake,
        reaction_type: &ReactionType,
        limit: usize,
    ) -> Vec<Reaction> {
        self.posts
            .get(&post_id)
            .and_then(|post| {
                post.by_type
                    .get(reaction_type)
                    .map(|group| group.values().take(limit).cloned().collect())
            })
            .unwrap_or_default()
    }

    /// Group sizes, read under the post's entry lock in one pass
    pub fn type_counts(&self, post_id: Snowflake) -> Vec<(ReactionType, usize)> {
        self.posts
            .get(&post_id)
            .map(|post| {
                post.by_type
                    .iter()
                    .map(|(reaction_type, group)| (reaction_type.clone(), group.len()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Re-derive the three performance indexes from the unique index while
    /// readers and writers keep running.
    ///
    /// Every record is re-attached under its own identity entry, then every
    /// derived entry the unique index no longer backs is dropped. No lock
    /// wider than one map entry is ever held. Returns the number of records
    /// re-indexed.
    pub fn rebuild(&self) -> usize {
        let mut records = 0;
        for record in self.identity.iter() {
            self.attach(record.value());
            records += 1;
        }

        for (slot, record) in self.derived_entries() {
            if self.is_orphan(&slot, &record) {
                self.evict(&slot, &record);
            }
        }
        records
    }

    /// Check that the performance indexes hold exactly the records of the
    /// unique index, each at its current position and type.
    ///
    /// Runs alongside writers. A write racing the check is seen either
    /// before or after it, never half applied.
    pub fn is_consistent(&self) -> bool {
        let all_indexed = self.identity.iter().all(|record| {
            let record = record.value();
            let key = timeline_key(record);
            let in_post = self.posts.get(&record.post_id).is_some_and(|post| {
                post.timeline.get(&key) == Some(record)
                    && post
                        .by_type
                        .get(&record.reaction_type)
                        .and_then(|group| group.get(&key))
                        == Some(record)
            });
            let in_user = self
                .users
                .get(&record.user_id)
                .is_some_and(|timeline| timeline.get(&key) == Some(record));
            in_post && in_user
        });

        all_indexed
            && self
                .derived_entries()
                .into_iter()
                .all(|(slot, record)| !self.is_orphan(&slot, &record) || !self.holds(&slot, &record))
    }

    /// Drop a record into the post and user indexes, one entry lock at a time
    fn attach(&self, reaction: &Reaction) {
        self.posts.entry(reaction.post_id).or_default().attach(reaction);
        self.users
            .entry(reaction.user_id)
            .or_default()
            .insert(timeline_key(reaction), reaction.clone());
    }

    fn detach(&self, reaction: &Reaction) {
        if let Some(mut post) = self.posts.get_mut(&reaction.post_id) {
            post.detach(reaction);
        }
        self.posts.remove_if(&reaction.post_id, |_, post| post.is_empty());

        if let Some(mut timeline) = self.users.get_mut(&reaction.user_id) {
            timeline.remove(&timeline_key(reaction));
        }
        self.users.remove_if(&reaction.user_id, |_, timeline| timeline.is_empty());
    }

    /// Copy of every derived entry. Each map shard is locked only while it
    /// is copied, and no identity entry is touched meanwhile.
    fn derived_entries(&self) -> Vec<(Slot, Reaction)> {
        let mut entries = Vec::new();
        for post in self.posts.iter() {
            let post_id = *post.key();
            entries.extend(
                post.timeline
                    .values()
                    .map(|r| (Slot::PostTimeline(post_id), r.clone())),
            );
            for (reaction_type, group) in &post.by_type {
                entries.extend(
                    group
                        .values()
                        .map(|r| (Slot::PostGroup(post_id, reaction_type.clone()), r.clone())),
                );
            }
        }
        for timeline in self.users.iter() {
            let user_id = *timeline.key();
            entries.extend(
                timeline
                    .values()
                    .map(|r| (Slot::UserTimeline(user_id), r.clone())),
            );
        }
        entries
    }

    /// Whether the unique index no longer backs `record` as `slot` files it.
    /// The identity lookup waits out any writer on the key. Record ids are
    /// never reused, so an entry found orphaned stays orphaned.
    fn is_orphan(&self, slot: &Slot, record: &Reaction) -> bool {
        !slot.fits(record)
            || self
                .identity
                .get(&record.key())
                .is_none_or(|current| *current != *record)
    }

    /// Whether `slot` still holds exactly `record`
    fn holds(&self, slot: &Slot, record: &Reaction) -> bool {
        let key = timeline_key(record);
        match slot {
            Slot::PostTimeline(post_id) => self
                .posts
                .get(post_id)
                .is_some_and(|post| post.timeline.get(&key) == Some(record)),
            Slot::PostGroup(post_id, reaction_type) => self.posts.get(post_id).is_some_and(|post| {
                post.by_type
                    .get(reaction_type)
                    .and_then(|group| group.get(&key))
                    == Some(record)
            }),
            Slot::UserTimeline(user_id) => self
                .users
                .get(user_id)
                .is_some_and(|timeline| timeline.get(&key) == Some(record)),
        }
    }

    /// Remove `record` from `slot` if that entry still holds exactly it
    fn evict(&self, slot: &Slot, record: &Reaction) {
        let key = timeline_key(record);
        match slot {
            Slot::PostTimeline(post_id) => {
                if let Some(mut post) = self.posts.get_mut(post_id) {
                    if post.timeline.get(&key) == Some(record) {
                        post.timeline.remove(&key);
                    }
                }
                self.posts.remove_if(post_id, |_, post| post.is_unused());
            }
            Slot::PostGroup(post_id, reaction_type) => {
                if let Some(mut post) = self.posts.get_mut(post_id) {
                    if let Some(group) = post.by_type.get_mut(reaction_type) {
                        if group.get(&key) == Some(record) {
                            group.remove(&key);
                        }
                        if group.is_empty() {
                            post.by_type.remove(reaction_type);
                        }
                    }
                }
                self.posts.remove_if(post_id, |_, post| post.is_unused());
            }
            Slot::UserTimeline(user_id) => {
                if let Some(mut timeline) = self.users.get_mut(user_id) {
                    if timeline.get(&key) == Some(record) {
                        timeline.remove(&key);
                    }
                }
                self.users.remove_if(user_id, |_, timeline| timeline.is_empty());
            }
        }
    }
}
