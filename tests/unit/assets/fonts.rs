use super::*;

#[test]
fn free_tier_sees_first_twenty_families() {
    let free = available_fonts(Entitlements::free());
    assert_eq!(free.len(), FREE_TIER_FONT_COUNT);
    assert_eq!(free[0], "Roboto");
    assert_eq!(available_fonts(Entitlements::premium()).len(), FONT_CATALOG.len());
}

#[test]
fn font_index_beyond_tier_is_rejected() {
    assert!(font_at(Entitlements::free(), 25).is_err());
    assert_eq!(
        font_at(Entitlements::premium(), 25).unwrap(),
        FONT_CATALOG[25]
    );
    assert!(font_at(Entitlements::premium(), FONT_CATALOG.len()).is_err());
}

#[test]
fn availability_ignores_case() {
    assert!(is_font_available(Entitlements::free(), "roboto"));
    assert!(!is_font_available(Entitlements::free(), FONT_CATALOG[30]));
    assert!(is_font_available(Entitlements::premium(), FONT_CATALOG[30]));
}

#[test]
fn catalog_has_no_duplicates() {
    let unique: BTreeSet<String> = FONT_CATALOG.iter().map(|f| family_key(f)).collect();
    assert_eq!(unique.len(), FONT_CATALOG.len());
}

#[test]
fn registry_publishes_new_generations() {
    let reg = FontRegistry::new();
    let before = reg.snapshot();
    reg.insert_face(FontFace::new("Roboto", vec![1, 2, 3], 0));
    let after = reg.snapshot();

    assert!(!before.is_loaded("Roboto"));
    assert!(after.is_loaded("roboto"));
    assert_eq!(after.generation(), before.generation() + 1);
}

#[test]
fn failed_family_is_settled_and_later_load_wins() {
    let reg = FontRegistry::new();
    reg.mark_failed("Impact");
    assert!(reg.snapshot().is_settled("Impact"));
    assert!(!reg.snapshot().is_loaded("Impact"));

    reg.insert_face(FontFace::new("Impact", vec![0], 0));
    assert!(reg.snapshot().is_loaded("Impact"));
}

#[test]
fn wait_for_times_out_on_unsettled_family() {
    let reg = FontRegistry::new();
    let wanted: BTreeSet<String> = ["Roboto".to_string()].into_iter().collect();
    let (_, settled) = reg.wait_for(&wanted, Duration::from_millis(10));
    assert!(!settled);
}

#[test]
fn wait_for_wakes_on_publication() {
    let reg = Arc::new(FontRegistry::new());
    let wanted: BTreeSet<String> = ["Roboto".to_string()].into_iter().collect();

    let writer = Arc::clone(&reg);
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        writer.mark_failed("Roboto");
    });

    let (set, settled) = reg.wait_for(&wanted, Duration::from_secs(5));
    handle.join().unwrap();
    assert!(settled);
    assert!(set.is_settled("Roboto"));
}

#[test]
fn loader_without_sources_marks_families_failed() {
    let reg = FontRegistry::new();
    let loader = FontLoader::new(FontSources::default());
    loader.load_blocking(&reg, ["Roboto", "Arial"]);

    let set = reg.snapshot();
    assert!(set.is_settled("Roboto"));
    assert!(set.is_settled("Arial"));
    assert!(set.is_empty());
}

#[test]
fn loader_skips_already_requested_families() {
    let reg = FontRegistry::new();
    let loader = FontLoader::new(FontSources::default());
    loader.load_blocking(&reg, ["Roboto"]);
    let generation = reg.snapshot().generation();
    loader.load_blocking(&reg, ["roboto"]);
    assert_eq!(reg.snapshot().generation(), generation);
}
