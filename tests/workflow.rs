// tests/workflow.rs

//! End-to-end recipe workflow tests: cook prebuilt and from-source
//! packages against locally staged artifacts and a fake build tool.

mod common;

use galley::{
    Arch, BuildType, Compiler, Error, Os, Settings, Workflow, WorkflowConfig,
};
use galley::recipe::{parse_manifest, validate_manifest};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PREBUILT_TEMPLATE: &str = r#"
[package]
name = "quill"
kind = "prebuilt"
description = "Prebuilt test fixture"
license = "Apache-2.0"

[platforms]
supported = [
    { os = "Linux", arch = "x86_64" },
    { os = "Macos", arch = "armv8" },
]

[options.shared]
domain = "bool"
default = true
locked = true

[binaries."1.2.0".Linux.x86_64]
url = "@BIN_URL@"
checksum = "@BIN_SUM@"

[licenses."1.2.0"]
url = "@LIC_URL@"
checksum = "@LIC_SUM@"

[metadata]
file_name = "quill"
target_name = "quill::lib"
library = "quill"

[metadata.system_libs]
Linux = ["rt", "pthread", "m", "dl"]

[metadata.frameworks]
Macos = ["Foundation", "Security"]
"#;

const SOURCE_TEMPLATE: &str = r#"
[package]
name = "quill"
kind = "source"
description = "From-source test fixture"
license = "Apache-2.0"

[platforms]
supported = [
    { os = "Linux", arch = "x86_64" },
    { os = "Macos", arch = "armv8" },
]

[options.shared]
domain = "bool"
default = false

[options.fPIC]
domain = "bool"
default = true
remove_on = ["Windows"]

[options.LOGGER_AUTOINIT]
domain = "bool"
default = true

[source."1.3.4"]
url = "@SRC_URL@"
checksum = "@SRC_SUM@"

[[patches."1.3.4"]]
file = "patches/return-one.patch"

[metadata]
file_name = "quill"
target_name = "quill::lib"
library = "quill"

[metadata.system_libs]
Linux = ["rt", "pthread", "m", "dl"]

[metadata.frameworks]
Macos = ["Foundation", "Security"]
"#;

const PATCH: &str = "\
--- a/src/version.c
+++ b/src/version.c
@@ -1,1 +1,1 @@
-int quill_version(void) { return 0; }
+int quill_version(void) { return 1; }
";

fn linux_settings(build_type: BuildType) -> Settings {
    Settings::new(Os::Linux, Arch::X86_64, Compiler::Gcc, build_type)
}

fn config_in(dir: &Path) -> WorkflowConfig {
    WorkflowConfig {
        cache_dir: dir.join("cache"),
        output_root: dir.join("out"),
        work_root: Some(dir.join("work")),
        ..WorkflowConfig::default()
    }
}

/// Stage a prebuilt binary drop and return the filled-in manifest TOML.
fn stage_prebuilt_fixture(dir: &TempDir) -> String {
    let drop = dir.path().join("drop");
    fs::create_dir_all(drop.join("lib")).unwrap();
    fs::create_dir_all(drop.join("include")).unwrap();
    fs::write(drop.join("lib/libquill.so"), b"\x7fELF fixture").unwrap();
    fs::write(drop.join("include/quill.h"), "#pragma once\n").unwrap();

    let archive = dir.path().join("quill-1.2.0-linux-x86_64.tar.gz");
    common::tar_gz(&archive, ".", &drop);

    let license = dir.path().join("LICENSE");
    fs::write(&license, "Apache License 2.0\n").unwrap();

    PREBUILT_TEMPLATE
        .replace("@BIN_URL@", &common::file_url(&archive))
        .replace("@BIN_SUM@", &common::checksum_of(&archive))
        .replace("@LIC_URL@", &common::file_url(&license))
        .replace("@LIC_SUM@", &common::checksum_of(&license))
}

#[test]
fn prebuilt_recipe_cooks_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let toml = stage_prebuilt_fixture(&dir);

    let manifest = parse_manifest(&toml).unwrap();
    validate_manifest(&manifest).unwrap();

    let mut workflow = Workflow::new(
        manifest,
        dir.path(),
        "1.2.0",
        linux_settings(BuildType::Release),
        config_in(dir.path()),
    );
    let cooked = workflow.run().unwrap();

    // Staged layout: libraries, headers, license text, metadata document.
    assert!(cooked.package_dir.join("lib/libquill.so").is_file());
    assert!(cooked.package_dir.join("include/quill.h").is_file());
    assert!(cooked.package_dir.join("licenses/LICENSE").is_file());

    let document =
        fs::read_to_string(cooked.package_dir.join("galley-metadata.json")).unwrap();
    assert!(document.contains("package_id"));

    // Round-trip: the declared library name must exist under lib/.
    assert_eq!(cooked.metadata.libs, vec!["quill".to_string()]);
    let staged: Vec<_> = fs::read_dir(cooked.package_dir.join("lib"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(staged.iter().any(|name| name.contains("quill")));

    assert_eq!(cooked.metadata.target_alias, "quill::shared");
    assert_eq!(cooked.metadata.system_libs, vec!["rt", "pthread", "m", "dl"]);
    assert!(cooked.metadata.frameworks.is_empty());

    // package_info is a pure projection: calling it again changes nothing.
    assert_eq!(workflow.package_info(), cooked.metadata);
}

#[test]
fn prebuilt_identity_ignores_compiler_and_build_type() {
    let dir = tempfile::tempdir().unwrap();
    let toml = stage_prebuilt_fixture(&dir);

    let mut ids = Vec::new();
    for (compiler, build_type) in [
        (Compiler::Gcc, BuildType::Release),
        (Compiler::Clang, BuildType::Debug),
    ] {
        let manifest = parse_manifest(&toml).unwrap();
        let mut workflow = Workflow::new(
            manifest,
            dir.path(),
            "1.2.0",
            Settings::new(Os::Linux, Arch::X86_64, compiler, build_type),
            config_in(dir.path()),
        );
        workflow.validate().unwrap();
        workflow.configure().unwrap();
        ids.push(workflow.package_info().package_id);
    }

    assert_eq!(ids[0], ids[1]);
}

#[test]
fn missing_version_locator_leaves_no_trace() {
    let dir = tempfile::tempdir().unwrap();
    let toml = stage_prebuilt_fixture(&dir);

    let manifest = parse_manifest(&toml).unwrap();
    let mut workflow = Workflow::new(
        manifest,
        dir.path(),
        "1.0.0",
        linux_settings(BuildType::Release),
        config_in(dir.path()),
    );

    workflow.validate().unwrap();
    workflow.configure().unwrap();
    let err = workflow.acquire().unwrap_err();
    match err {
        Error::MissingVersionLocator(what) => assert!(what.contains("1.0.0")),
        other => panic!("expected MissingVersionLocator, got {other:?}"),
    }

    // No directories created or modified.
    assert!(!dir.path().join("out").exists());
    assert!(!dir.path().join("work").exists());
    assert!(!dir.path().join("cache").exists());
}

#[test]
fn unsupported_platform_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let toml = stage_prebuilt_fixture(&dir);

    let manifest = parse_manifest(&toml).unwrap();
    let mut workflow = Workflow::new(
        manifest,
        dir.path(),
        "1.2.0",
        Settings::new(Os::Windows, Arch::X86_64, Compiler::Msvc, BuildType::Release),
        config_in(dir.path()),
    );

    let err = workflow.run().unwrap_err();
    match err {
        Error::UnsupportedConfiguration(msg) => {
            assert!(msg.contains("Windows/x86_64"), "unexpected message: {msg}");
        }
        other => panic!("expected UnsupportedConfiguration, got {other:?}"),
    }

    assert!(!dir.path().join("out").exists());
    assert!(!dir.path().join("work").exists());
}

#[cfg(unix)]
mod with_fake_tool {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// A stand-in for the external build tool: logs its argument lines and
    /// creates the expected artifacts on `--install`.
    fn write_fake_tool(dir: &Path, log: &Path) -> PathBuf {
        let script = format!(
            "#!/bin/sh\nset -e\nprintf '%s\\n' \"$*\" >> \"{log}\"\n\
             if [ \"$1\" = \"--install\" ]; then\n\
             \tprefix=\"$4\"\n\
             \tmkdir -p \"$prefix/lib\" \"$prefix/include\"\n\
             \t: > \"$prefix/lib/libquill.a\"\n\
             \t: > \"$prefix/lib/libquilld.a\"\n\
             \t: > \"$prefix/include/quill.h\"\n\
             fi\nexit 0\n",
            log = log.display()
        );

        let path = dir.join("fake-tool.sh");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Stage a source tree archive plus patch and return the manifest TOML.
    fn stage_source_fixture(dir: &TempDir) -> String {
        let tree = dir.path().join("tree");
        fs::create_dir_all(tree.join("src")).unwrap();
        fs::write(
            tree.join("src/version.c"),
            "int quill_version(void) { return 0; }\n",
        )
        .unwrap();
        fs::write(tree.join("LICENSE"), "Apache License 2.0\n").unwrap();

        let archive = dir.path().join("quill-1.3.4.tar.gz");
        common::tar_gz(&archive, "quill-1.3.4", &tree);

        let patches = dir.path().join("patches");
        fs::create_dir_all(&patches).unwrap();
        fs::write(patches.join("return-one.patch"), PATCH).unwrap();

        SOURCE_TEMPLATE
            .replace("@SRC_URL@", &common::file_url(&archive))
            .replace("@SRC_SUM@", &common::checksum_of(&archive))
    }

    #[test]
    fn source_recipe_cooks_with_external_tool() {
        let dir = tempfile::tempdir().unwrap();
        let toml = stage_source_fixture(&dir);
        let log = dir.path().join("tool.log");
        let tool = write_fake_tool(dir.path(), &log);

        let manifest = parse_manifest(&toml).unwrap();
        validate_manifest(&manifest).unwrap();

        let mut config = config_in(dir.path());
        config.tool_path = Some(tool);
        config.keep_workdir = true;

        let mut workflow = Workflow::new(
            manifest,
            dir.path(),
            "1.3.4",
            linux_settings(BuildType::Release),
            config,
        );
        let cooked = workflow.run().unwrap();

        // Tool phases ran in order with the generated variable map.
        let log_text = fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = log_text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("-DLIB_STATIC=ON"));
        assert!(lines[0].contains("-DfPIC=ON"));
        assert!(lines[0].contains("-DLOGGER_AUTOINIT=ON"));
        assert!(lines[1].starts_with("--build"));
        assert!(lines[2].starts_with("--install"));

        // Artifacts and license staged; release naming in metadata.
        assert!(cooked.package_dir.join("lib/libquill.a").is_file());
        assert!(cooked.package_dir.join("licenses/LICENSE").is_file());
        assert_eq!(cooked.metadata.libs, vec!["quill".to_string()]);

        // The registered patch was applied to the unpacked tree.
        let work_root = dir.path().join("work");
        let workdir = fs::read_dir(&work_root)
            .unwrap()
            .map(|e| e.unwrap().path())
            .find(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with("galley-quill-1.3.4-"))
            })
            .expect("working directory was kept");
        let patched =
            fs::read_to_string(workdir.join("source/src/version.c")).unwrap();
        assert!(patched.contains("return 1;"));
    }

    #[test]
    fn debug_build_type_switches_library_name() {
        let dir = tempfile::tempdir().unwrap();
        let toml = stage_source_fixture(&dir);
        let log = dir.path().join("tool.log");
        let tool = write_fake_tool(dir.path(), &log);

        let manifest = parse_manifest(&toml).unwrap();
        let mut config = config_in(dir.path());
        config.tool_path = Some(tool);

        let mut workflow = Workflow::new(
            manifest,
            dir.path(),
            "1.3.4",
            linux_settings(BuildType::Debug),
            config,
        );
        let cooked = workflow.run().unwrap();

        assert_eq!(cooked.metadata.libs, vec!["quilld".to_string()]);
        assert!(cooked.package_dir.join("lib/libquilld.a").is_file());
    }

    #[test]
    fn failing_tool_surfaces_raw_output() {
        let dir = tempfile::tempdir().unwrap();
        let toml = stage_source_fixture(&dir);

        let script = "#!/bin/sh\necho 'missing dependency: quill-core' >&2\nexit 3\n";
        let tool = dir.path().join("broken-tool.sh");
        fs::write(&tool, script).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let manifest = parse_manifest(&toml).unwrap();
        let mut config = config_in(dir.path());
        config.tool_path = Some(tool);

        let mut workflow = Workflow::new(
            manifest,
            dir.path(),
            "1.3.4",
            linux_settings(BuildType::Release),
            config,
        );
        let err = workflow.run().unwrap_err();
        match err {
            Error::BuildFailed { phase, detail } => {
                assert_eq!(phase, "configure");
                assert!(detail.contains("missing dependency: quill-core"));
            }
            other => panic!("expected BuildFailed, got {other:?}"),
        }
    }
}

#[test]
fn shipped_sample_recipes_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("recipes");

    for name in ["quill.toml", "quill-prebuilt.toml"] {
        let manifest =
            galley::recipe::parse_manifest_file(&root.join(name)).unwrap();
        let warnings = validate_manifest(&manifest).unwrap();
        assert!(warnings.is_empty(), "{name}: {warnings:?}");
    }
}
