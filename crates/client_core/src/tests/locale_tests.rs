use super::*;
use crate::{
    preference::MemoryLocalePreferenceStore,
    test_support::{dictionary, CountingDictionarySource},
};

fn source() -> CountingDictionarySource {
    CountingDictionarySource::new()
        .with_module("en", "nav", &[("home", "Home"), ("greeting", "Hello, {name}!")])
        .with_module("en", "player", &[("play", "Play")])
        .with_module("my", "nav", &[("home", "ပင်မ")])
}

fn controller(source: Arc<CountingDictionarySource>) -> Arc<LocaleController> {
    LocaleController::new(
        SupportedLocales::default(),
        source,
        Arc::new(MemoryLocalePreferenceStore::default()),
    )
}

fn vars(entries: &[(&str, &str)]) -> Variables {
    dictionary(entries)
}

#[tokio::test]
async fn concurrent_loads_share_a_single_fetch() {
    let source = Arc::new(source());
    let controller = controller(source.clone());

    let (first, second) = tokio::join!(controller.load_module("nav"), controller.load_module("nav"));
    let first = first.expect("first");
    let second = second.expect("second");

    assert_eq!(source.module_fetches(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.get("home").map(String::as_str), Some("Home"));
}

#[tokio::test]
async fn loaded_modules_are_not_fetched_again() {
    let source = Arc::new(source());
    let controller = controller(source.clone());

    controller.load_module("nav").await.expect("load");
    controller.load_module("nav").await.expect("cached");
    assert_eq!(source.module_fetches(), 1);
}

#[tokio::test]
async fn lookup_falls_back_to_default_then_key() {
    let controller = controller(Arc::new(source()));
    controller.load_module("nav").await.expect("load");

    assert_eq!(controller.t("nav", "home", None, None), "Home");
    assert_eq!(
        controller.t("nav", "missing.key", Some("Fallback"), None),
        "Fallback"
    );
    assert_eq!(controller.t("nav", "missing.key", None, None), "missing.key");
    assert_eq!(controller.t("unloaded", "home", None, None), "home");
}

#[tokio::test]
async fn lookup_substitutes_variables() {
    let controller = controller(Arc::new(source()));
    controller.load_module("nav").await.expect("load");

    assert_eq!(
        controller.t("nav", "greeting", None, Some(&vars(&[("name", "Mya")]))),
        "Hello, Mya!"
    );
    assert_eq!(
        controller.t("nav", "absent", Some("{count} of {total}"), Some(&vars(&[("count", "2")]))),
        "2 of {total}"
    );
}

#[test]
fn interpolate_leaves_unbalanced_braces_alone() {
    let variables = vars(&[("a", "1")]);
    assert_eq!(interpolate("{a}{", &variables), "1{");
    assert_eq!(interpolate("{{a}}", &variables), "{1}");
    assert_eq!(interpolate("no placeholders", &variables), "no placeholders");
    assert_eq!(interpolate("{}", &variables), "{}");
}

#[tokio::test]
async fn set_locale_clears_modules_and_loads_while_flagged() {
    let (source, gate) = source().gate_locales();
    let source = Arc::new(source);
    let controller = controller(source.clone());
    controller.load_module("nav").await.expect("load");
    assert!(controller.is_module_loaded("nav"));

    let switching = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.set_locale("my").await }
    });
    while source.all_fetches() == 0 {
        tokio::task::yield_now().await;
    }

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.locale, Locale::new("my"));
    assert!(snapshot.is_loading);
    assert!(snapshot.loaded_modules.is_empty());
    assert_eq!(controller.t("nav", "home", None, None), "home");

    gate.notify_one();
    switching.await.expect("join").expect("set locale");

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.loaded_modules, vec!["nav".to_string()]);
    assert_eq!(controller.t("nav", "home", None, None), "ပင်မ");
}

#[tokio::test]
async fn set_locale_rejects_unsupported_values_immediately() {
    let source = Arc::new(source());
    let controller = controller(source.clone());
    controller.load_module("nav").await.expect("load");

    let err = controller.set_locale("fr").await.expect_err("unsupported");
    assert!(matches!(err, LocaleError::UnsupportedLocale(_)));
    assert_eq!(controller.locale(), Locale::new("en"));
    assert!(controller.is_module_loaded("nav"));
    assert_eq!(source.all_fetches(), 0);
}

#[tokio::test]
async fn set_locale_persists_the_preference() {
    let preferences = Arc::new(MemoryLocalePreferenceStore::default());
    let controller = LocaleController::new(
        SupportedLocales::default(),
        Arc::new(source()),
        preferences.clone(),
    );
    controller.set_locale("my").await.expect("switch");
    assert_eq!(
        preferences.persisted_locale().await.expect("read"),
        Some("my".to_string())
    );
}

#[tokio::test]
async fn module_fetch_from_abandoned_locale_is_discarded() {
    let (source, gate) = source().gate_modules();
    let source = Arc::new(source);
    let controller = controller(source.clone());

    let loading = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.load_module("player").await }
    });
    while source.module_fetches() == 0 {
        tokio::task::yield_now().await;
    }

    controller.set_locale("my").await.expect("switch");
    gate.notify_one();

    let err = loading.await.expect("join").expect_err("stale");
    assert!(matches!(err, LocaleError::Stale { .. }));
    assert!(!controller.is_module_loaded("player"));
    assert_eq!(controller.locale(), Locale::new("my"));
}

#[tokio::test]
async fn superseded_locale_switch_is_discarded() {
    let (source, gate) = source().gate_locales();
    let source = Arc::new(source);
    let controller = controller(source.clone());

    let to_my = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.set_locale("my").await }
    });
    while source.all_fetches() < 1 {
        tokio::task::yield_now().await;
    }
    let to_en = tokio::spawn({
        let controller = Arc::clone(&controller);
        async move { controller.set_locale("en").await }
    });
    while source.all_fetches() < 2 {
        tokio::task::yield_now().await;
    }

    gate.notify_one();
    let err = to_my.await.expect("join").expect_err("superseded");
    assert!(matches!(
        err,
        LocaleError::Stale { ref requested, module: None } if *requested == Locale::new("my")
    ));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.locale, Locale::new("en"));
    assert!(snapshot.is_loading);
    assert!(snapshot.loaded_modules.is_empty());

    gate.notify_one();
    to_en.await.expect("join").expect("second switch");
    let snapshot = controller.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(controller.t("nav", "home", None, None), "Home");
}

#[tokio::test]
async fn failed_module_fetch_degrades_and_can_retry() {
    let source = Arc::new(source().failing_first(1));
    let controller = controller(source.clone());
    let translator = controller.translator("nav");

    let err = controller.load_module("nav").await.expect_err("outage");
    assert!(matches!(err, LocaleError::FetchFailure { .. }));
    assert!(translator.loading());
    assert_eq!(translator.translate("home", Some("Home?"), None), "Home?");

    translator.ensure_loaded().await;
    assert!(!translator.loading());
    assert_eq!(translator.translate("home", None, None), "Home");
    assert_eq!(source.module_fetches(), 2);
}

#[tokio::test]
async fn translator_loading_is_per_module() {
    let controller = controller(Arc::new(source()));
    let nav = controller.translator("nav");
    let player = controller.translator("player");

    nav.ensure_loaded().await;
    assert!(!nav.loading());
    assert!(player.loading());
    assert_eq!(player.locale(), Locale::new("en"));
    assert_eq!(nav.module(), "nav");
}

#[tokio::test]
async fn bootstrap_uses_persisted_locale_and_initial_dictionaries() {
    let source = Arc::new(source());
    let controller = LocaleController::new(
        SupportedLocales::default(),
        source.clone(),
        Arc::new(MemoryLocalePreferenceStore::new(Some("my"))),
    );
    let mut initial = DictionarySet::new();
    initial.insert("nav".to_string(), dictionary(&[("home", "seeded")]));

    let locale = controller.bootstrap(Some(initial)).await.expect("bootstrap");
    assert_eq!(locale, Locale::new("my"));
    assert_eq!(controller.t("nav", "home", None, None), "seeded");
    assert_eq!(source.all_fetches(), 0);
    assert!(!controller.is_loading());
}

#[tokio::test]
async fn bootstrap_fetches_when_nothing_was_prefetched() {
    let source = Arc::new(source());
    let controller = LocaleController::new(
        SupportedLocales::default(),
        source.clone(),
        Arc::new(MemoryLocalePreferenceStore::new(Some("klingon"))),
    );

    let locale = controller.bootstrap(None).await.expect("bootstrap");
    assert_eq!(locale, Locale::new("en"));
    assert_eq!(source.all_fetches(), 1);
    assert_eq!(controller.t("player", "play", None, None), "Play");
}

#[tokio::test]
async fn module_load_publishes_events() {
    let controller = controller(Arc::new(source()));
    let mut events = controller.subscribe();
    controller.load_module("nav").await.expect("load");

    match events.try_recv() {
        Ok(LocaleEvent::ModuleLoaded { module, locale }) => {
            assert_eq!(module, "nav");
            assert_eq!(locale, Locale::new("en"));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(matches!(events.try_recv(), Ok(LocaleEvent::StateChanged(_))));
}
