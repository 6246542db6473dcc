//! Sync orchestration: catalog lookup, fetch, update detection, conflicts.
//!
//! Each item is processed independently and a failure is recorded against
//! that item only. Conflicts are queued during the main pass and resolved
//! afterwards in one batch against a registry loaded from the store.

use std::collections::HashSet;

use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use super::conflict::{ConflictResolver, ResolutionResult, is_conflict};
use super::detector::compare_records;
use super::partial::missing_references;
use super::report::SyncReport;
use crate::catalog::{CatalogSkill, SkillCatalog, SortBy};
use crate::config::SyncConfig;
use crate::core::{Registry, SkillRecord, apply_document_features, normalize_tags};
use crate::error::Result;
use crate::fetch::ContentFetcher;
use crate::storage::SkillStore;

/// What to sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncTarget {
    /// Named skills, each looked up in the catalog.
    Names(Vec<String>),
    /// The first `n` catalog entries under the configured sort.
    Top(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub limit: usize,
    pub sort_by: SortBy,
    pub semantic: bool,
    /// Rewrite even when tracked metadata is unchanged.
    pub force: bool,
    pub max_tags: usize,
}

impl SyncOptions {
    #[must_use]
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            limit: config.limit.max(1),
            sort_by: config.sort_by,
            semantic: false,
            force: false,
            max_tags: config.max_tags,
        }
    }
}

enum ItemOutcome {
    Created,
    Updated(String),
    Unchanged,
    Missing(String),
    Conflict,
}

pub struct SyncEngine<'a> {
    catalog: &'a dyn SkillCatalog,
    fetcher: &'a ContentFetcher,
    store: &'a SkillStore,
    resolver: ConflictResolver,
    options: SyncOptions,
    progress: Option<ProgressBar>,
}

impl<'a> SyncEngine<'a> {
    #[must_use]
    pub const fn new(
        catalog: &'a dyn SkillCatalog,
        fetcher: &'a ContentFetcher,
        store: &'a SkillStore,
        resolver: ConflictResolver,
        options: SyncOptions,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            store,
            resolver,
            options,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run one sync and rebuild the index.
    ///
    /// Only a failed top-N listing or a store failure outside any single
    /// item aborts the run.
    pub async fn run(&mut self, target: SyncTarget) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        match target {
            SyncTarget::Names(names) => {
                for name in names {
                    self.tick(&name);
                    match self.lookup(&name).await {
                        Ok(Some(entry)) => self.sync_entry(entry, &mut report).await,
                        Ok(None) => {
                            warn!(skill = %name, "not found in catalog");
                            report.record_skipped(&name, "not found in catalog");
                        }
                        Err(err) => {
                            warn!(skill = %name, error = %err, "catalog lookup failed");
                            report.record_failure(&name, err);
                        }
                    }
                }
            }
            SyncTarget::Top(count) => {
                let entries = self
                    .catalog
                    .search("", 1, count, self.options.sort_by)
                    .await?;
                for entry in entries.into_iter().take(count) {
                    self.tick(&entry.name);
                    self.sync_entry(entry, &mut report).await;
                }
            }
        }

        if let Some(progress) = &self.progress {
            progress.finish_and_clear();
        }
        self.resolve_conflicts(&mut report)?;
        let index = self.store.rebuild_index()?;
        info!(
            synced = report.synced,
            skipped = report.skipped,
            failed = report.failed,
            conflicts = report.conflicts,
            indexed = index.meta.total,
            "sync finished"
        );
        Ok(report)
    }

    fn tick(&self, name: &str) {
        if let Some(progress) = &self.progress {
            progress.set_message(name.to_string());
            progress.tick();
        }
    }

    /// Exact-name catalog match; several origins go to the decision provider.
    async fn lookup(&mut self, name: &str) -> Result<Option<CatalogSkill>> {
        let results = if self.options.semantic {
            self.catalog.semantic_search(name).await?
        } else {
            self.catalog
                .search(name, 1, self.options.limit, self.options.sort_by)
                .await?
        };

        let mut matches: Vec<CatalogSkill> =
            results.into_iter().filter(|skill| skill.name == name).collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => {
                matches.sort_by(|a, b| b.stars.cmp(&a.stars));
                let index = self
                    .resolver
                    .provider()
                    .choose_origin(name, &matches)
                    .min(matches.len() - 1);
                debug!(skill = %name, origin = %matches[index].repository, "origin selected");
                Ok(Some(matches.swap_remove(index)))
            }
        }
    }

    async fn sync_entry(&mut self, entry: CatalogSkill, report: &mut SyncReport) {
        let name = entry.name.clone();
        match self.process(entry, report).await {
            Ok(ItemOutcome::Created) => {
                info!(skill = %name, "created");
                report.record_created();
            }
            Ok(ItemOutcome::Updated(reason)) => {
                info!(skill = %name, reason = %reason, "updated");
                report.record_updated();
            }
            Ok(ItemOutcome::Unchanged) => {
                debug!(skill = %name, "unchanged");
                report.record_skipped(&name, "unchanged");
            }
            Ok(ItemOutcome::Missing(reason)) => {
                warn!(skill = %name, reason = %reason, "skipped");
                report.record_skipped(&name, reason);
            }
            Ok(ItemOutcome::Conflict) => report.record_conflict(),
            Err(err) => {
                warn!(skill = %name, error = %err, "sync failed");
                report.record_failure(&name, err);
            }
        }
    }

    async fn process(
        &mut self,
        entry: CatalogSkill,
        report: &mut SyncReport,
    ) -> Result<ItemOutcome> {
        let mut record = record_from_catalog(&entry);

        let Some(content) = self.fetcher.fetch(&record.source_url).await? else {
            return Ok(ItemOutcome::Missing(format!(
                "no SKILL.md found at {}",
                record.source_url
            )));
        };
        record.content = content.primary;
        record.files = content.files;

        apply_document_features(&mut record);
        record.tags = normalize_tags(&record.tags, &record.origin_owner(), self.options.max_tags);

        let missing = missing_references(&record.content, &record.files);
        if !missing.is_empty() {
            let warning = format!(
                "'{}' links to {} but no auxiliary files were fetched",
                record.name,
                missing.join(", ")
            );
            warn!("{warning}");
            report.warn(warning);
        }

        let existing = self.store.load(&record.name)?;
        let check = compare_records(existing.as_ref(), &record);
        if !check.needs_update && !self.options.force {
            return Ok(ItemOutcome::Unchanged);
        }

        if let Some(existing) = existing
            && is_conflict(Some(&existing), &record)
        {
            self.resolver.enqueue(existing, record);
            return Ok(ItemOutcome::Conflict);
        }

        self.store.write(&record)?;
        if check.reason == "new" {
            Ok(ItemOutcome::Created)
        } else {
            Ok(ItemOutcome::Updated(check.reason))
        }
    }

    fn resolve_conflicts(&mut self, report: &mut SyncReport) -> Result<()> {
        if self.resolver.pending() == 0 {
            return Ok(());
        }

        let mut registry = Registry::from_records(self.store.load_all()?);
        let stored: HashSet<String> = registry
            .records()
            .iter()
            .map(|record| record.name.clone())
            .collect();
        debug!(
            stored = registry.len(),
            pending = self.resolver.pending(),
            "resolving conflicts"
        );
        let results = self.resolver.resolve_all(&mut registry);

        // A batch may rename into a slot and then replace it again; the
        // registry holds the final record, so each name is written once.
        let mut written = HashSet::new();
        for name in results.iter().filter_map(ResolutionResult::written_name) {
            if !written.insert(name) {
                continue;
            }
            let Some(record) = registry.get(name) else {
                continue;
            };
            match self.store.write(record) {
                Ok(()) if stored.contains(name) => report.record_updated(),
                Ok(()) => report.record_created(),
                Err(err) => {
                    warn!(skill = %name, error = %err, "could not persist resolution");
                    report.record_failure(name, err);
                }
            }
        }

        report.resolution = self.resolver.summary();
        report
            .warnings
            .extend(report.resolution.warnings.iter().cloned());
        Ok(())
    }
}

/// Seed a record from catalog metadata; content is filled in later.
#[must_use]
pub fn record_from_catalog(entry: &CatalogSkill) -> SkillRecord {
    let mut record = SkillRecord::new(&entry.name, &entry.repository);
    record.description = entry.description.clone();
    record.tags = entry.tags.clone();
    record.version = entry.version.clone().unwrap_or_default();
    record.author = entry.author.clone().unwrap_or_default();
    record.stars = entry.stars;
    record.updated_at = entry.updated_at_utc();
    record
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::config::GithubConfig;
    use crate::sync::ConflictChoice;
    use crate::sync::decision::{NonInteractive, ScriptedDecisions};
    use crate::test_utils::fixtures::UnitTestFixture;
    use crate::test_utils::logging::init_test_tracing;

    #[derive(Default)]
    struct StubCatalog {
        skills: Vec<CatalogSkill>,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SkillCatalog for StubCatalog {
        async fn search(
            &self,
            query: &str,
            _page: usize,
            limit: usize,
            _sort_by: SortBy,
        ) -> Result<Vec<CatalogSkill>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(self.skills.iter().take(limit).cloned().collect())
        }

        async fn semantic_search(&self, query: &str) -> Result<Vec<CatalogSkill>> {
            self.queries.lock().unwrap().push(format!("semantic:{query}"));
            Ok(self.skills.clone())
        }
    }

    fn entry(name: &str, owner: &str, stars: u64) -> CatalogSkill {
        CatalogSkill {
            name: name.into(),
            description: format!("{name} helper"),
            stars,
            repository: format!("https://github.com/{owner}/skills/tree/main/{name}"),
            ..CatalogSkill::default()
        }
    }

    async fn serve_skill(server: &MockServer, owner: &str, name: &str, body: &str) {
        let raw = format!("/raw/{owner}/skills/main/{name}/SKILL.md");
        let list = format!("/repos/{owner}/skills/contents/{name}");
        let body = body.to_string();
        server
            .mock_async(move |when, then| {
                when.method(GET).path(raw.as_str());
                then.status(200).body(body.as_str());
            })
            .await;
        server
            .mock_async(move |when, then| {
                when.method(GET).path(list.as_str());
                then.status(200).json_body(json!([]));
            })
            .await;
    }

    fn fetcher(server: &MockServer) -> ContentFetcher {
        init_test_tracing();
        ContentFetcher::new(&GithubConfig {
            api_base: server.base_url(),
            raw_base: format!("{}/raw", server.base_url()),
            retry_base_delay_ms: 0,
            ..GithubConfig::default()
        })
        .unwrap()
    }

    fn options() -> SyncOptions {
        SyncOptions::from_config(&SyncConfig::default())
    }

    fn resolver(choice: ConflictChoice) -> ConflictResolver {
        ConflictResolver::new(Box::new(NonInteractive::new(choice)))
    }

    #[tokio::test]
    async fn creates_then_skips_unchanged() {
        let server = MockServer::start_async().await;
        serve_skill(&server, "acme", "pdf", "---\nversion: 1.2.0\n---\n# PDF").await;
        let catalog = StubCatalog {
            skills: vec![entry("pdf", "acme", 3)],
            ..StubCatalog::default()
        };
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        let fetcher = fetcher(&server);

        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            resolver(ConflictChoice::Skip),
            options(),
        );
        let report = engine.run(SyncTarget::Names(vec!["pdf".into()])).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.synced, 1);

        let stored = store.load("pdf").unwrap().unwrap();
        assert_eq!(stored.version, "1.2.0");
        assert_eq!(stored.tags[0], "acme");
        assert!(stored.tags.contains(&"documents".to_string()));
        assert_eq!(store.read_index().unwrap().unwrap().meta.total, 1);

        let report = engine.run(SyncTarget::Names(vec!["pdf".into()])).await.unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.skipped_items[0].reason, "unchanged");
    }

    #[tokio::test]
    async fn unknown_name_is_skipped() {
        let server = MockServer::start_async().await;
        let catalog = StubCatalog::default();
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        let fetcher = fetcher(&server);

        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            resolver(ConflictChoice::Skip),
            options(),
        );
        let report = engine.run(SyncTarget::Names(vec!["ghost".into()])).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.skipped_items[0].reason, "not found in catalog");
    }

    #[tokio::test]
    async fn missing_primary_document_is_skipped_not_failed() {
        let server = MockServer::start_async().await;
        let catalog = StubCatalog {
            skills: vec![entry("pdf", "acme", 1)],
            ..StubCatalog::default()
        };
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        let fetcher = fetcher(&server);

        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            resolver(ConflictChoice::Skip),
            options(),
        );
        let report = engine.run(SyncTarget::Names(vec!["pdf".into()])).await.unwrap();
        assert_eq!(report.failed, 0);
        assert_eq!(report.skipped, 1);
        assert!(store.load("pdf").unwrap().is_none());
    }

    #[tokio::test]
    async fn failure_is_isolated_per_item() {
        let server = MockServer::start_async().await;
        serve_skill(&server, "acme", "good", "# Good").await;
        let bad = entry("bad", "acme", 1);
        server
            .mock_async(|when, then| {
                when.method(GET).path("/raw/acme/skills/main/bad/SKILL.md");
                then.status(429);
            })
            .await;
        let catalog = StubCatalog {
            skills: vec![bad, entry("good", "acme", 1)],
            ..StubCatalog::default()
        };
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        let fetcher = fetcher(&server);

        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            resolver(ConflictChoice::Skip),
            options(),
        );
        let report = engine.run(SyncTarget::Top(2)).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].name, "bad");
        assert!(report.failures[0].error.contains("rate limit"));
        assert_eq!(report.created, 1);
    }

    #[tokio::test]
    async fn conflict_keep_both_writes_renamed_record() {
        let server = MockServer::start_async().await;
        serve_skill(&server, "acme", "docs-writer", "# Docs").await;
        let catalog = StubCatalog {
            skills: vec![entry("docs-writer", "acme", 9)],
            ..StubCatalog::default()
        };
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        let mut local = SkillRecord::new("docs-writer", "https://github.com/old/skills");
        local.content = "# Old".into();
        store.write(&local).unwrap();
        let fetcher = fetcher(&server);

        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            resolver(ConflictChoice::KeepBoth),
            options(),
        );
        let report = engine
            .run(SyncTarget::Names(vec!["docs-writer".into()]))
            .await
            .unwrap();

        assert_eq!(report.conflicts, 1);
        assert_eq!(report.resolution.renamed, 1);
        assert_eq!(report.created, 1);
        assert_eq!(store.load("docs-writer").unwrap().unwrap().owner, "old");
        let renamed = store.load("acme-docs-writer").unwrap().unwrap();
        assert_eq!(renamed.original_name.as_deref(), Some("docs-writer"));
        assert_eq!(
            store.load_content("acme-docs-writer").unwrap().as_deref(),
            Some("# Docs")
        );
        assert_eq!(store.read_index().unwrap().unwrap().meta.total, 2);
    }

    #[tokio::test]
    async fn rename_then_cascade_writes_slot_once() {
        let server = MockServer::start_async().await;
        serve_skill(&server, "acme", "docs-writer", "# Docs").await;
        let catalog = StubCatalog {
            skills: vec![entry("docs-writer", "acme", 9)],
            ..StubCatalog::default()
        };
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        fixture.create_skill("docs-writer", "old");
        let fetcher = fetcher(&server);

        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            resolver(ConflictChoice::KeepBoth),
            options(),
        );
        let report = engine
            .run(SyncTarget::Names(vec![
                "docs-writer".into(),
                "docs-writer".into(),
            ]))
            .await
            .unwrap();

        assert_eq!(report.conflicts, 2);
        assert_eq!(report.resolution.renamed, 1);
        assert_eq!(report.resolution.replaced, 1);
        assert_eq!((report.created, report.updated, report.synced), (1, 0, 1));
        assert!(store.load("acme-docs-writer").unwrap().is_some());
        assert_eq!(store.read_index().unwrap().unwrap().meta.total, 2);
    }

    #[tokio::test]
    async fn conflict_skip_leaves_local_record() {
        let server = MockServer::start_async().await;
        serve_skill(&server, "acme", "docs-writer", "# Docs").await;
        let catalog = StubCatalog {
            skills: vec![entry("docs-writer", "acme", 9)],
            ..StubCatalog::default()
        };
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        fixture.create_skill("docs-writer", "old");
        let fetcher = fetcher(&server);

        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            resolver(ConflictChoice::Skip),
            options(),
        );
        let report = engine
            .run(SyncTarget::Names(vec!["docs-writer".into()]))
            .await
            .unwrap();
        assert_eq!(report.resolution.skipped, 1);
        assert_eq!(report.synced, 0);
        assert_eq!(store.load("docs-writer").unwrap().unwrap().owner, "old");
    }

    #[tokio::test]
    async fn multiple_origins_go_to_provider() {
        let server = MockServer::start_async().await;
        serve_skill(&server, "small", "pdf", "# Small").await;
        serve_skill(&server, "big", "pdf", "# Big").await;
        let catalog = StubCatalog {
            skills: vec![entry("pdf", "small", 1), entry("pdf", "big", 50)],
            ..StubCatalog::default()
        };
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        let fetcher = fetcher(&server);

        let provider = ScriptedDecisions::new(Vec::new()).with_origins(vec![1]);
        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            ConflictResolver::new(Box::new(provider)),
            options(),
        );
        engine.run(SyncTarget::Names(vec!["pdf".into()])).await.unwrap();
        assert_eq!(store.load("pdf").unwrap().unwrap().owner, "small");
    }

    #[tokio::test]
    async fn semantic_mode_uses_semantic_search() {
        let server = MockServer::start_async().await;
        serve_skill(&server, "acme", "pdf", "# PDF").await;
        let catalog = StubCatalog {
            skills: vec![entry("pdf", "acme", 1)],
            ..StubCatalog::default()
        };
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        let fetcher = fetcher(&server);

        let mut opts = options();
        opts.semantic = true;
        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            resolver(ConflictChoice::Skip),
            opts,
        );
        engine.run(SyncTarget::Names(vec!["pdf".into()])).await.unwrap();
        assert_eq!(
            catalog.queries.lock().unwrap().as_slice(),
            ["semantic:pdf".to_string()]
        );
    }

    #[tokio::test]
    async fn partial_fetch_is_reported() {
        let server = MockServer::start_async().await;
        serve_skill(&server, "acme", "pdf", "See [api](references/api.md)").await;
        let catalog = StubCatalog {
            skills: vec![entry("pdf", "acme", 1)],
            ..StubCatalog::default()
        };
        let fixture = UnitTestFixture::new();
        let store = fixture.store();
        let fetcher = fetcher(&server);

        let mut engine = SyncEngine::new(
            &catalog,
            &fetcher,
            &store,
            resolver(ConflictChoice::Skip),
            options(),
        );
        let report = engine.run(SyncTarget::Names(vec!["pdf".into()])).await.unwrap();
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("references/api.md"));
    }
}
