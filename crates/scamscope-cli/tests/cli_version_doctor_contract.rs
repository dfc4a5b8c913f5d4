fn scamscope() -> std::process::Command {
    let bin = assert_cmd::cargo::cargo_bin!("scamscope");
    let mut cmd = std::process::Command::new(bin);
    // Disable `.env` autoload so these contracts stay hermetic.
    cmd.env("SCAMSCOPE_DOTENV", "0")
        .env_remove("SCAMSCOPE_PROVIDER")
        .env_remove("SCAMSCOPE_GEMINI_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("GOOGLE_API_KEY")
        .env_remove("SCAMSCOPE_OPENAI_COMPAT_BASE_URL");
    cmd
}

#[test]
fn scamscope_version_contract() {
    let out = scamscope()
        .args(["version"])
        .output()
        .expect("run scamscope version");

    assert!(out.status.success(), "scamscope version failed");
    let s = String::from_utf8_lossy(&out.stdout);
    let v: serde_json::Value = serde_json::from_str(&s).expect("parse version json");

    assert_eq!(v["schema_version"].as_u64(), Some(1));
    assert_eq!(v["kind"].as_str(), Some("version"));
    assert_eq!(v["name"].as_str(), Some("scamscope"));
    assert!(!v["version"].as_str().unwrap_or("").is_empty());
}

#[test]
fn scamscope_version_text_output_contract() {
    let out = scamscope()
        .args(["version", "--output", "text"])
        .output()
        .expect("run scamscope version --output text");

    assert!(out.status.success());
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(s.trim_start().starts_with("scamscope "));
}

#[test]
fn scamscope_doctor_reports_booleans_and_never_secrets() {
    let out = scamscope()
        .args(["doctor"])
        .env("SCAMSCOPE_GEMINI_API_KEY", "sk-very-secret-value")
        .output()
        .expect("run scamscope doctor");

    assert!(out.status.success(), "scamscope doctor failed");
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(!s.contains("sk-very-secret-value"), "doctor leaked a key");
    let v: serde_json::Value = serde_json::from_str(&s).expect("parse doctor json");

    assert_eq!(v["kind"].as_str(), Some("doctor"));
    assert_eq!(v["provider"].as_str(), Some("gemini"));
    assert_eq!(v["ok"].as_bool(), Some(true));
    assert_eq!(v["configured"]["gemini"].as_bool(), Some(true));
    assert_eq!(v["configured"]["openai_compat"].as_bool(), Some(false));
    for t in ["tesseract", "pdftotext", "mutool", "pandoc"] {
        assert!(v["tools"][t].is_boolean(), "tools.{t}");
    }
    assert_eq!(
        v["features"]["vision_gemini"].as_bool(),
        Some(cfg!(feature = "vision-gemini"))
    );
    assert!(v.get("elapsed_ms").is_some());
}

#[test]
fn scamscope_doctor_flags_unknown_provider() {
    let out = scamscope()
        .args(["doctor", "--output", "json"])
        .env("SCAMSCOPE_PROVIDER", "carrier-pigeon")
        .output()
        .expect("run scamscope doctor");

    assert!(out.status.success());
    let v: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("parse doctor json");
    assert_eq!(v["ok"].as_bool(), Some(false));
    assert!(v["provider"].is_null());
    assert!(v["provider_error"]
        .as_str()
        .unwrap_or("")
        .contains("carrier-pigeon"));
}
