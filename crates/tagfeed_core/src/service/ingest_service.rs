//! Deduplicating ingestion engine.
//!
//! # Responsibility
//! - Persist one candidate under a target tag group unless its external id
//!   is already stored anywhere.
//! - Run a full cycle: registry -> queries -> fetch -> ingest, isolating
//!   failures per query and per candidate.
//!
//! # Invariants
//! - At most one post per external id, whatever group or worker saw it.
//! - First group to store an external id keeps it; later matches are
//!   skipped, never moved or duplicated.
//! - Losing a create race is a skip, not an error.
//! - An empty registry performs no fetches and no writes.

use crate::model::post::{NewPost, PostId, PostValidationError};
use crate::model::tag_group::{TagGroup, TagGroupId};
use crate::repo::post_repo::{InsertOutcome, PostRepository};
use crate::repo::tag_group_repo::TagGroupRepository;
use crate::repo::user_repo::UserDirectory;
use crate::repo::RepoResult;
use crate::search::client::{RawPost, SearchApi};
use crate::search::query::{build_queries_for_group, QueryOptions, SearchQuery};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

/// Result of ingesting one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Created(PostId),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The existence check found the external id.
    AlreadyStored,
    /// A concurrent writer inserted the external id between check and write.
    LostRace,
}

/// Cycle stage a failure was recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    BuildQueries,
    Fetch,
    Ingest,
}

/// One isolated failure inside a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleFailure {
    pub stage: FailureStage,
    pub tag_group_id: TagGroupId,
    /// Search term of the failing query, when the failure belongs to one.
    pub term: Option<String>,
    /// Candidate external id, for ingest failures.
    pub external_id: Option<String>,
    pub message: String,
}

/// Aggregate outcome of one ingestion cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub run_id: Uuid,
    pub groups: usize,
    /// Groups whose queries could not be built.
    pub failed_groups: usize,
    pub queries: usize,
    pub failed_queries: usize,
    pub fetched: usize,
    pub ingested: usize,
    pub skipped: usize,
    pub failed_candidates: usize,
    pub failures: Vec<CycleFailure>,
}

impl CycleReport {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            groups: 0,
            failed_groups: 0,
            queries: 0,
            failed_queries: 0,
            fetched: 0,
            ingested: 0,
            skipped: 0,
            failed_candidates: 0,
            failures: Vec::new(),
        }
    }

    /// Whether every query and candidate went through without failure.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ingestion engine over the registry, user directory, post store and
/// search API seams.
pub struct IngestService<G, U, P, S> {
    groups: G,
    users: U,
    posts: P,
    search: S,
    options: QueryOptions,
}

impl<G, U, P, S> IngestService<G, U, P, S>
where
    G: TagGroupRepository,
    U: UserDirectory,
    P: PostRepository,
    S: SearchApi,
{
    pub fn new(groups: G, users: U, posts: P, search: S, options: QueryOptions) -> Self {
        Self {
            groups,
            users,
            posts,
            search,
            options,
        }
    }

    /// Ingests one candidate into `tag_group_id`.
    ///
    /// # Contract
    /// - Existing external id (in any group): skipped, author untouched.
    /// - Otherwise the author is found or created and the post inserted
    ///   with create-if-absent semantics.
    /// - Idempotent for repeated calls with the same candidate.
    /// - The external id is keyed with surrounding whitespace trimmed.
    pub fn ingest_candidate(
        &self,
        candidate: &RawPost,
        tag_group_id: TagGroupId,
    ) -> RepoResult<IngestOutcome> {
        let external_id = candidate.id.trim();
        if external_id.is_empty() {
            return Err(PostValidationError::BlankExternalId.into());
        }
        if self.posts.post_exists(external_id)? {
            return Ok(IngestOutcome::Skipped(SkipReason::AlreadyStored));
        }

        let author = self
            .users
            .find_or_create_user(&candidate.author_id, candidate.author_image_url.as_deref())?;
        let post = NewPost {
            external_id: external_id.to_string(),
            text: candidate.text.clone(),
            user_id: author.id,
            tag_group_id,
            created_at: candidate.created_at,
        };

        match self.posts.insert_post_if_absent(&post)? {
            InsertOutcome::Inserted(post_id) => Ok(IngestOutcome::Created(post_id)),
            InsertOutcome::AlreadyExists => {
                debug!(
                    "event=post_ingest module=ingest status=skip reason=lost_race external_id={external_id} group_id={tag_group_id}"
                );
                Ok(IngestOutcome::Skipped(SkipReason::LostRace))
            }
        }
    }

    /// Builds the search queries for one group.
    pub fn build_queries(&self, group: &TagGroup) -> RepoResult<Vec<SearchQuery>> {
        build_queries_for_group(&self.posts, group, &self.options)
    }

    /// Runs one ingestion cycle over every registered group.
    ///
    /// Only a failure to enumerate the registry aborts the cycle; everything
    /// downstream is recorded in the returned report.
    pub fn run_cycle(&self) -> RepoResult<CycleReport> {
        let started_at = Instant::now();
        let mut report = CycleReport::new(Uuid::new_v4());
        info!(
            "event=ingest_cycle module=ingest status=start run_id={}",
            report.run_id
        );

        let groups = match self.groups.list_tag_groups() {
            Ok(groups) => groups,
            Err(err) => {
                error!(
                    "event=ingest_cycle module=ingest status=error run_id={} duration_ms={} error_code=registry_unavailable error={err}",
                    report.run_id,
                    started_at.elapsed().as_millis()
                );
                return Err(err);
            }
        };

        for group in &groups {
            report.groups += 1;
            self.ingest_group(group, &mut report);
        }

        info!(
            "event=ingest_cycle module=ingest status=ok run_id={} duration_ms={} groups={} failed_groups={} queries={} failed_queries={} fetched={} ingested={} skipped={} failed_candidates={}",
            report.run_id,
            started_at.elapsed().as_millis(),
            report.groups,
            report.failed_groups,
            report.queries,
            report.failed_queries,
            report.fetched,
            report.ingested,
            report.skipped,
            report.failed_candidates
        );
        Ok(report)
    }

    fn ingest_group(&self, group: &TagGroup, report: &mut CycleReport) {
        if !group.has_tags() {
            info!(
                "event=ingest_group module=ingest status=skip reason=no_tags run_id={} group_id={}",
                report.run_id, group.id
            );
            return;
        }

        let queries = match self.build_queries(group) {
            Ok(queries) => queries,
            Err(err) => {
                warn!(
                    "event=ingest_group module=ingest status=error run_id={} group_id={} error_code=build_queries_failed error={err}",
                    report.run_id, group.id
                );
                report.failed_groups += 1;
                report.failures.push(CycleFailure {
                    stage: FailureStage::BuildQueries,
                    tag_group_id: group.id,
                    term: None,
                    external_id: None,
                    message: err.to_string(),
                });
                return;
            }
        };

        for query in &queries {
            report.queries += 1;
            self.ingest_query(group.id, query, report);
        }
    }

    fn ingest_query(
        &self,
        tag_group_id: TagGroupId,
        query: &SearchQuery,
        report: &mut CycleReport,
    ) {
        let started_at = Instant::now();
        let candidates = match self.search.search(query) {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(
                    "event=search_fetch module=ingest status=error run_id={} group_id={tag_group_id} term={} duration_ms={} error={err}",
                    report.run_id,
                    query.term,
                    started_at.elapsed().as_millis()
                );
                report.failed_queries += 1;
                report.failures.push(CycleFailure {
                    stage: FailureStage::Fetch,
                    tag_group_id,
                    term: Some(query.term.clone()),
                    external_id: None,
                    message: err.to_string(),
                });
                return;
            }
        };
        debug!(
            "event=search_fetch module=ingest status=ok run_id={} group_id={tag_group_id} term={} since_id={} candidates={} duration_ms={}",
            report.run_id,
            query.term,
            query.since_id.as_deref().unwrap_or("-"),
            candidates.len(),
            started_at.elapsed().as_millis()
        );

        report.fetched += candidates.len();
        for candidate in &candidates {
            match self.ingest_candidate(candidate, tag_group_id) {
                Ok(IngestOutcome::Created(_)) => report.ingested += 1,
                Ok(IngestOutcome::Skipped(_)) => report.skipped += 1,
                Err(err) => {
                    warn!(
                        "event=post_ingest module=ingest status=error run_id={} group_id={tag_group_id} external_id={} error={err}",
                        report.run_id, candidate.id
                    );
                    report.failed_candidates += 1;
                    report.failures.push(CycleFailure {
                        stage: FailureStage::Ingest,
                        tag_group_id,
                        term: Some(query.term.clone()),
                        external_id: Some(candidate.id.clone()),
                        message: err.to_string(),
                    });
                }
            }
        }
    }
}
