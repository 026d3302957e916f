use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR missing"));
    let skills_root = manifest_dir.join("skills");

    if !skills_root.exists() {
        panic!("Skills directory not found: {}", skills_root.display());
    }
    println!("cargo:rerun-if-changed={}", skills_root.display());

    let mut skills = collect_skills(&skills_root);
    skills.sort();

    for (_, path) in &skills {
        println!("cargo:rerun-if-changed={}", path.display());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR missing"));
    fs::write(out_dir.join("generated_skills.rs"), generate_skills_rs(&skills))
        .expect("Failed to write generated_skills.rs");
}

/// `(skill id, SKILL.md path)` for every `skills/<id>/SKILL.md`.
fn collect_skills(root: &Path) -> Vec<(String, PathBuf)> {
    let entries = fs::read_dir(root)
        .unwrap_or_else(|err| panic!("Failed to read dir {}: {}", root.display(), err));

    let mut skills = Vec::new();
    for entry in entries {
        let entry = entry.unwrap_or_else(|err| panic!("Failed to read dir entry: {}", err));
        let path = entry.path();
        let skill_file = path.join("SKILL.md");

        if path.is_dir() && skill_file.is_file() {
            let id = entry.file_name().to_string_lossy().to_string();
            skills.push((id, skill_file));
        }
    }
    skills
}

fn generate_skills_rs(skills: &[(String, PathBuf)]) -> String {
    let mut out = String::new();
    out.push_str("pub static GENERATED_SKILLS: &[(&str, &str)] = &[\n");

    for (id, path) in skills {
        out.push_str("    (\"");
        out.push_str(&escape_rust_string(id));
        out.push_str("\", include_str!(\"");
        out.push_str(&escape_rust_string(&path.to_string_lossy()));
        out.push_str("\")),\n");
    }

    out.push_str("];\n");
    out
}

fn escape_rust_string(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}
