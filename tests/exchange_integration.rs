mod common;

use anyhow::Result;
use common::TestEnv;
use preference_system::exchange::codec;
use preference_system::menu::PreferenceSystemManager;
use preference_system::preference_enum;

preference_enum! {
    pub enum Lamp { Warm, Cold }
}

const KITCHEN: &str = "com.example.kitchen";
const LIGHTING: &str = "com.example.lighting";

fn kitchen(env: &TestEnv) -> Result<PreferenceSystemManager> {
    let mut m = PreferenceSystemManager::new(&env.ctx, KITCHEN, "Kitchen Tweaks");
    m.add_property("count", 1)?
        .add_property("ratio", 0.5f32)?
        .add_property("title", String::from("chef"))?;
    Ok(m)
}

fn lighting(env: &TestEnv) -> Result<PreferenceSystemManager> {
    let mut m = PreferenceSystemManager::new(&env.ctx, LIGHTING, "Lighting");
    m.add_property("bright", false)?.add_property("lamp", Lamp::Warm)?;
    Ok(m)
}

fn exported_token(env: &TestEnv, name: &str) -> Result<String> {
    let status = env.ctx.sets().export(name, false, &[KITCHEN, LIGHTING]);
    assert!(status.success, "{}", status);
    env.ctx
        .sets()
        .token(name)
        .ok_or_else(|| anyhow::anyhow!("no token for {}", name))
}

#[test]
fn test_export_writes_token_file() -> Result<()> {
    let env = TestEnv::new();
    let k = kitchen(&env)?;
    let _l = lighting(&env)?;
    k.set("count", 4)?;

    let status = env.ctx.sets().export("Speedrun", true, &[KITCHEN, LIGHTING]);
    assert!(status.success);
    let path = env.ctx.config().preference_sets_dir().join("Speedrun.txt");
    assert!(status.message.starts_with("Preference Set exported to"));
    assert!(path.exists());

    let set = codec::decode(&std::fs::read_to_string(&path)?)?;
    assert_eq!(set.name, "Speedrun");
    assert!(set.read_only_mode);
    assert_eq!(set.managers.len(), 2);
    assert_eq!(env.ctx.sets().cached_set_names(), vec!["Speedrun".to_string()]);

    let again = env.ctx.sets().export("Speedrun", false, &[KITCHEN]);
    assert!(!again.success);
    assert_eq!(again.message, "Speedrun.txt is used.");
    Ok(())
}

#[test]
fn test_export_rejects_bad_requests() -> Result<()> {
    let env = TestEnv::new();
    let _k = kitchen(&env)?;

    let status = env.ctx.sets().export("Nothing", false, &[]);
    assert_eq!(status.message, "At least one mod must be selected.");
    let status = env.ctx.sets().export("Ghost", false, &["com.example.ghost"]);
    assert_eq!(status.message, "com.example.ghost not found!");
    let status = env.ctx.sets().export("", false, &[KITCHEN]);
    assert!(!status.success);
    Ok(())
}

#[test]
fn test_import_into_another_install_and_load() -> Result<()> {
    let source = TestEnv::new();
    let sk = kitchen(&source)?;
    let sl = lighting(&source)?;
    sk.set("count", 12)?;
    sk.set("ratio", 2.5f32)?;
    sk.set("title", String::from("sous chef"))?;
    sl.set("bright", true)?;
    sl.set("lamp", Lamp::Cold)?;
    let token = exported_token(&source, "Speedrun")?;

    let target = TestEnv::new();
    let tk = kitchen(&target)?;
    let tl = lighting(&target)?;

    let status = target.ctx.sets().import(&format!("  {}\n", token), Some("Shared"));
    assert!(status.success, "{}", status);
    assert!(status.message.starts_with("Preference Set imported and saved to"));

    assert!(target.ctx.sets().import(&token, None).success);

    {
        let source_sets = source.ctx.sets();
        let original = source_sets.cached_set("Speedrun").expect("exported set cached");
        let sets = target.ctx.sets();
        for name in ["Shared", "Speedrun"] {
            let imported = sets.cached_set(name).expect("imported set cached");
            for guid in [KITCHEN, LIGHTING] {
                assert_eq!(
                    imported.manager(guid).map(|data| data.preferences()),
                    original.manager(guid).map(|data| data.preferences()),
                );
            }
        }
        assert_eq!(sets.cached_set("Speedrun").map(|set| set.created_at), Some(original.created_at));
        assert!(sets.preview("Shared").starts_with("Name: Shared\n"));
    }

    let status = target.ctx.sets().load("Shared");
    assert_eq!(status.message, "Loaded Preference Set Shared");
    assert_eq!(tk.get::<i32>("count")?, 12);
    assert_eq!(tk.get::<f32>("ratio")?, 2.5);
    assert_eq!(tk.get::<String>("title")?, "sous chef");
    assert!(tl.get::<bool>("bright")?);
    assert_eq!(tl.get::<Lamp>("lamp")?, Lamp::Cold);
    assert_eq!(tk.preferences().borrow().profile(), "Shared_Loaded");
    assert_eq!(target.ctx.profiles()?.get_profile(KITCHEN), "Shared_Loaded");
    assert_eq!(target.ctx.sets().last_loaded_set_name(), Some("Shared"));
    assert_eq!(target.ctx.sets().preference_value::<i32>(KITCHEN, "count"), 12);
    Ok(())
}

#[test]
fn test_tamper_detection_follows_live_values() -> Result<()> {
    let env = TestEnv::new();
    let k = kitchen(&env)?;
    let _l = lighting(&env)?;
    k.set("count", 3)?;
    exported_token(&env, "Baseline")?;

    assert!(!env.ctx.sets().is_preferences_tampered());
    assert!(env.ctx.sets().load("Baseline").success);
    assert!(!env.ctx.sets().is_preferences_tampered());

    k.set("count", 4)?;
    assert!(env.ctx.sets().is_preferences_tampered());
    k.set("count", 3)?;
    assert!(!env.ctx.sets().is_preferences_tampered());

    let status = env.ctx.sets().delete("Baseline");
    assert_eq!(status.message, "Deleted Preference Set Baseline");
    k.set("count", 9)?;
    assert!(!env.ctx.sets().is_preferences_tampered());
    assert_eq!(env.ctx.sets().last_loaded_set_name(), None);
    Ok(())
}

#[test]
fn test_load_reports_missing_mods() -> Result<()> {
    let source = TestEnv::new();
    let sk = kitchen(&source)?;
    let _sl = lighting(&source)?;
    sk.set("count", 7)?;
    let token = exported_token(&source, "Partial")?;

    let target = TestEnv::new();
    let tk = kitchen(&target)?;
    assert!(target.ctx.sets().import(&token, None).success);

    let status = target.ctx.sets().load("Partial");
    assert!(!status.success);
    assert_eq!(status.message, "Failed to load Preference Set Partial for Lighting");
    assert_eq!(tk.get::<i32>("count")?, 7);

    let status = target.ctx.sets().load("Nope");
    assert_eq!(status.message, "Preference Set Nope not found!");
    Ok(())
}

#[test]
fn test_import_rejects_bad_tokens_and_collisions() -> Result<()> {
    let env = TestEnv::new();
    let _k = kitchen(&env)?;
    let _l = lighting(&env)?;
    let token = exported_token(&env, "Speedrun")?;

    let status = env.ctx.sets().import("not a token!", None);
    assert_eq!(
        status.message,
        "Invalid Base64 string! Check that all the text is correctly copied."
    );

    let garbage = codec::compress_to_base64("{\"Name\": 5")?;
    let status = env.ctx.sets().import(&garbage, None);
    assert_eq!(
        status.message,
        "Invalid data contained in import! Check that all the text is correctly copied."
    );

    let status = env.ctx.sets().import(&token, None);
    assert!(!status.success);
    assert!(status.message.starts_with("Speedrun.txt is used."));

    assert!(env.ctx.sets().import(&token, Some("Copy")).success);
    assert_eq!(
        env.ctx.sets().cached_set_names(),
        vec!["Copy".to_string(), "Speedrun".to_string()]
    );
    Ok(())
}

#[test]
fn test_rescan_skips_unreadable_files() -> Result<()> {
    let env = TestEnv::new();
    let _k = kitchen(&env)?;
    let _l = lighting(&env)?;
    exported_token(&env, "Good")?;

    let dir = env.ctx.config().preference_sets_dir();
    std::fs::write(dir.join("broken.txt"), "garbage")?;
    env.ctx.sets().init_preference_sets();
    assert_eq!(env.ctx.sets().cached_set_names(), vec!["Good".to_string()]);
    assert_eq!(env.ctx.sets().preview("broken"), "");
    Ok(())
}

#[test]
fn test_non_finite_float_never_reaches_a_token() -> Result<()> {
    let env = TestEnv::new();
    let k = kitchen(&env)?;
    assert!(k.set("ratio", f32::NAN).is_err());
    assert!(k.set("ratio", f32::INFINITY).is_err());
    assert_eq!(k.get::<f32>("ratio")?, 0.5);

    let status = env.ctx.sets().export("Finite", false, &[KITCHEN]);
    assert!(status.success, "{}", status);
    assert_eq!(env.ctx.sets().cached_set_names(), vec!["Finite".to_string()]);

    let token = env.ctx.sets().token("Finite").expect("token written");
    let set = codec::decode(&token)?;
    assert_eq!(set.manager(KITCHEN).map(|data| data.len()), Some(3));
    Ok(())
}
