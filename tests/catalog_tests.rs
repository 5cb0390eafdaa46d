//! Catalog loading, ordering and coverage through the public API
use std::io::Write;

use tempfile::TempDir;

use site_showcase::application::{
    CatalogAudit, CatalogLoader, CatalogReader, QualityScorer, Tiebreak, read_rows, sort_catalog,
};
use site_showcase::domain::{MacroCategory, UrlState};
use site_showcase::infrastructure::{ArtifactStore, PreviewTier};

const WEBSITES: &str = "name,url,category,description,featured,hidden
Acme,acme.io,SaaS Tool,desc,true,false
Acme Mirror,www.acme.io,SaaS Tool,,false,false
Zeta Bank,https://zeta.bank,Fintech,Banking for people who hate banks,false,false
Hidden Gem,https://gem.dev,Portfolio,,false,true
Broken,not a url,Other,,false,false
,https://nameless.dev,,,false,false
";

#[test]
fn loads_a_real_csv_table() {
    let rows = read_rows(WEBSITES.as_bytes()).unwrap();
    assert_eq!(rows.len(), 6);

    let (entries, summary) = CatalogLoader::default().load(&rows);
    assert_eq!(summary.accepted, 4);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.skipped_invalid, 1);
    assert_eq!(summary.unresolvable, 1);

    let acme = &entries[0];
    assert_eq!(acme.slug, "acme");
    assert_eq!(acme.macro_category, MacroCategory::Saas);
    assert!(acme.featured);
    assert_eq!(entries[3].url_state, UrlState::Unresolvable);
}

#[tokio::test]
async fn reader_and_audit_agree_on_the_cache() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("websites.csv");
    std::fs::File::create(&csv).unwrap().write_all(WEBSITES.as_bytes()).unwrap();
    let store = ArtifactStore::new(dir.path().join("hero"), dir.path().join("full"), 16);

    ArtifactStore::write_artifact(&store.hero_path("zeta-bank"), &[9u8; 64]).await.unwrap();
    ArtifactStore::write_artifact(&store.fallback_path("broken"), &[9u8; 8]).await.unwrap();

    let reader = CatalogReader::new(CatalogLoader::default(), store.clone());
    let visible = reader.visible_entries(&csv, false).unwrap();
    let cards = reader.cards(&visible);
    let tiers: Vec<_> = cards.iter().map(|c| (c.slug.as_str(), c.tier)).collect();
    // "Broken" has neither a usable URL nor a specific category
    assert_eq!(tiers, vec![("acme", PreviewTier::Synthesized), ("zeta-bank", PreviewTier::Hero)]);

    let (entries, _) = CatalogLoader::default().load_file(&csv).unwrap();
    let audit = CatalogAudit::run(&entries, &store);
    assert_eq!((audit.visible, audit.hidden), (3, 1));
    assert_eq!(audit.hero.present, 1);
    assert_eq!(audit.hero.fallback_only, 1);
    assert_eq!(audit.missing_previews, vec!["acme", "hidden-gem"]);

    let json = serde_json::to_value(&audit).unwrap();
    assert_eq!(json["by_category"]["SaaS"], 1);
}

#[test]
fn score_tiebreak_prefers_complete_entries() {
    let rows = read_rows(
        "name,url,category,description,featured,hidden\n\
         Nova,https://nova.one,,,false,false\n\
         nova,https://nova.two,,A much longer description of nova,false,false\n"
            .as_bytes(),
    )
    .unwrap();
    let (mut entries, summary) = CatalogLoader::default().load(&rows);
    // same name after case folding is a duplicate
    assert_eq!(summary.duplicates, 1);

    let mut twin = entries[0].clone();
    twin.slug = "nova-2".into();
    twin.description = "A much longer description of nova".into();
    entries.push(twin);

    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path().join("h"), dir.path().join("f"), 1);
    let scorer = QualityScorer::new(store);
    sort_catalog(&mut entries, Tiebreak::Score(&scorer));
    assert_eq!(entries[0].slug, "nova-2");
}

#[test]
fn unpublishable_rows_are_loaded_but_not_shown() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("websites.csv");
    std::fs::write(
        &csv,
        "name,url,category,description,featured,hidden\n\
         Platform Link,https://land-book.com/websites/123,SaaS,,false,false\n\
         Vague,https://vague.io,Other,,false,false\n",
    )
    .unwrap();

    let (entries, summary) = CatalogLoader::default().load_file(&csv).unwrap();
    assert_eq!(summary.accepted, 2);
    assert!(entries.iter().all(|e| !e.is_showcase_ready()));

    let store = ArtifactStore::new(dir.path().join("hero"), dir.path().join("full"), 16);
    let reader = CatalogReader::new(CatalogLoader::default(), store);
    assert!(reader.visible_entries(&csv, false).unwrap().is_empty());
}
