//! End-to-end tests driving a real cmake toolchain.
//!
//! These exercise the full discovery → configure → build → install
//! protocol against a small generated project. Each test skips with a
//! note on stderr when the host has no cmake or no usable build
//! toolchain, the same environments a packaging run would refuse.

use std::fs;
use std::path::Path;
use std::process::Command;

use semver::Version;
use tempfile::TempDir;

use slipway::util::process::find_executable;
use slipway::{
    BuildSettings, CMakeError, CMakeProgram, CMakeSession, CacheValue, Generator, SearchContext,
};

const EXPECTED_OUTPUT: &str = "0 one 2 three \n";

/// Write the fixture project into `dir`.
fn write_simple_pure(dir: &Path) {
    fs::create_dir_all(dir).unwrap();

    fs::write(
        dir.join("CMakeLists.txt"),
        r#"cmake_minimum_required(VERSION 3.15)
project(simple_pure LANGUAGES CXX)

add_executable(simple_pure simple_pure.cpp)

install(TARGETS simple_pure RUNTIME DESTINATION bin)

if(DEFINED SLIPWAY)
  message(STATUS "SLIPWAY is defined to ${SLIPWAY}")
endif()
if(DEFINED SLIPWAY2)
  message(STATUS "SLIPWAY2 is defined to ${SLIPWAY2}")
endif()
"#,
    )
    .unwrap();

    fs::write(
        dir.join("simple_pure.cpp"),
        r#"#include <iostream>
#include <string>
#include <vector>

int main() {
  std::vector<std::string> words = {"0", "one", "2", "three"};
  for (const auto& word : words) {
    std::cout << word << " ";
  }
  std::cout << std::endl;
  return 0;
}
"#,
    )
    .unwrap();
}

/// Enable `RUST_LOG`-driven tracing output for debugging test runs.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

fn has_cxx_compiler() -> bool {
    ["c++", "g++", "clang++", "cl"]
        .iter()
        .any(|name| find_executable(name).is_some())
}

/// Pick a generator the host can actually drive, or `None` to skip.
fn usable_generator(ctx: &SearchContext) -> Option<Generator> {
    let generator = Generator::resolve(None, ctx);
    if ctx.is_windows() || ctx.generator_override.is_some() {
        return Some(generator);
    }

    let has_tool = find_executable("ninja").is_some()
        || find_executable("make").is_some()
        || find_executable("gmake").is_some();
    has_tool.then_some(generator)
}

/// Discover cmake and a generator, or skip the calling test.
fn session_inputs(minimum: &Version) -> Option<(CMakeProgram, Generator)> {
    init_tracing();
    let ctx = SearchContext::from_env();

    let program = match CMakeProgram::find(&ctx, minimum) {
        Ok(program) => program,
        Err(_) => {
            eprintln!("skipping: no cmake >= {minimum} available");
            return None;
        }
    };

    let Some(generator) = usable_generator(&ctx) else {
        eprintln!("skipping: no build toolchain for any known generator");
        return None;
    };

    if !ctx.is_windows() && !has_cxx_compiler() {
        eprintln!("skipping: no C++ compiler on PATH");
        return None;
    }

    Some((program, generator))
}

// ============================================================================
// discovery
// ============================================================================

#[test]
fn test_find_satisfies_the_minimum() {
    let ctx = SearchContext::from_env();

    match CMakeProgram::find(&ctx, &Version::new(3, 15, 0)) {
        Ok(program) => assert!(program.version >= Version::new(3, 15, 0)),
        Err(CMakeError::ToolNotFound { .. }) => eprintln!("skipping: no cmake available"),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_find_with_unsatisfiable_minimum_fails() {
    let ctx = SearchContext::from_env();

    let err = CMakeProgram::find(&ctx, &Version::new(99, 0, 0)).unwrap_err();
    assert!(matches!(err, CMakeError::ToolNotFound { .. }));
    assert!(err.to_string().contains("99.0.0"));
}

// ============================================================================
// configure / build / run
// ============================================================================

#[test]
fn test_configure_build_and_run() {
    let Some((program, generator)) = session_inputs(&Version::new(3, 15, 0)) else {
        return;
    };

    let tmp = TempDir::new().unwrap();
    let source_dir = tmp.path().join("src");
    write_simple_pure(&source_dir);

    let session = CMakeSession::new(
        program,
        generator,
        &source_dir,
        tmp.path().join("build"),
        "Release",
    )
    .jobs(2);

    session.configure(&[]).unwrap();
    session.build(None).unwrap();

    let binary = session.binary_path("simple_pure");
    let output = Command::new(&binary).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), EXPECTED_OUTPUT);
}

#[test]
fn test_reconfigure_is_idempotent() {
    let Some((program, generator)) = session_inputs(&Version::new(3, 15, 0)) else {
        return;
    };

    let tmp = TempDir::new().unwrap();
    let source_dir = tmp.path().join("src");
    write_simple_pure(&source_dir);

    let session = CMakeSession::new(
        program,
        generator,
        &source_dir,
        tmp.path().join("build"),
        "Release",
    );

    session.configure(&[]).unwrap();
    session.configure(&[]).unwrap();
    session.build(None).unwrap();
}

// ============================================================================
// install
// ============================================================================

#[test]
fn test_install_into_a_prefix() {
    let Some((program, generator)) = session_inputs(&Version::new(3, 15, 0)) else {
        return;
    };

    let tmp = TempDir::new().unwrap();
    let source_dir = tmp.path().join("src");
    write_simple_pure(&source_dir);
    let prefix = tmp.path().join("install");

    let session = CMakeSession::new(
        program,
        generator,
        &source_dir,
        tmp.path().join("build"),
        "Release",
    );

    session.configure(&[]).unwrap();
    session.build(None).unwrap();
    session.install(&prefix).unwrap();

    let binary = prefix.join("bin").join("simple_pure");
    let output = Command::new(&binary).output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), EXPECTED_OUTPUT);
}

// ============================================================================
// cache entries and defines
// ============================================================================

#[test]
fn test_cache_entry_and_define_are_reported() {
    let Some((program, generator)) = session_inputs(&Version::new(3, 15, 0)) else {
        return;
    };

    let tmp = TempDir::new().unwrap();
    let source_dir = tmp.path().join("src");
    write_simple_pure(&source_dir);

    let mut session = CMakeSession::new(
        program,
        generator,
        &source_dir,
        tmp.path().join("build"),
        "Release",
    )
    .env("CMAKE_COLOR_DIAGNOSTICS", "OFF");

    session.init_cache(&[("SLIPWAY".to_string(), CacheValue::Bool(true))]);
    let output = session
        .configure(&[("SLIPWAY2".to_string(), CacheValue::Bool(true))])
        .unwrap();

    assert!(output.stdout.contains("SLIPWAY is defined to ON"));
    assert!(output.stdout.contains("SLIPWAY2 is defined to ON"));
}

#[test]
fn test_define_overrides_a_cache_entry() {
    let Some((program, generator)) = session_inputs(&Version::new(3, 15, 0)) else {
        return;
    };

    let tmp = TempDir::new().unwrap();
    let source_dir = tmp.path().join("src");
    write_simple_pure(&source_dir);

    let mut session = CMakeSession::new(
        program,
        generator,
        &source_dir,
        tmp.path().join("build"),
        "Release",
    );

    session.init_cache(&[("SLIPWAY".to_string(), CacheValue::Bool(false))]);
    let output = session
        .configure(&[("SLIPWAY".to_string(), CacheValue::Bool(true))])
        .unwrap();

    assert!(output.stdout.contains("SLIPWAY is defined to ON"));
}

// ============================================================================
// failures
// ============================================================================

#[test]
fn test_build_failure_carries_captured_output() {
    let Some((program, generator)) = session_inputs(&Version::new(3, 15, 0)) else {
        return;
    };

    let tmp = TempDir::new().unwrap();
    let source_dir = tmp.path().join("src");
    write_simple_pure(&source_dir);
    fs::write(source_dir.join("simple_pure.cpp"), "this is not C++\n").unwrap();

    let session = CMakeSession::new(
        program,
        generator,
        &source_dir,
        tmp.path().join("build"),
        "Release",
    );

    session.configure(&[]).unwrap();
    match session.build(None) {
        Err(CMakeError::Build { output }) => {
            assert!(!output.success());
            assert!(!output.stderr.is_empty() || !output.stdout.is_empty());
        }
        other => panic!("expected a build error, got {other:?}"),
    }
}

// ============================================================================
// settings-driven session
// ============================================================================

#[test]
fn test_settings_drive_a_session() {
    let settings = BuildSettings::from_toml(
        r#"
minimum-version = "3.15"
build-type = "Release"
args = ["--no-warn-unused-cli"]

[define]
SLIPWAY2 = true
"#,
    )
    .unwrap();

    let minimum = settings.minimum().unwrap();
    let Some((program, generator)) = session_inputs(&minimum) else {
        return;
    };

    let tmp = TempDir::new().unwrap();
    let source_dir = tmp.path().join("src");
    write_simple_pure(&source_dir);

    let session = CMakeSession::new(
        program,
        generator,
        &source_dir,
        tmp.path().join("build"),
        settings.build_type(),
    )
    .args(settings.args.clone());

    let output = session.configure(&settings.defines()).unwrap();
    assert!(output.stdout.contains("SLIPWAY2 is defined to ON"));
}
