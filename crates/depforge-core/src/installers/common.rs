//! Installers available on every platform.

use std::path::{Path, PathBuf};

use depforge_schema::{LlvmVersion, Platform};

use crate::cmake::CMakeBuild;
use crate::exports::{Export, Exports};
use crate::installer::{InstallEnv, InstallError};
use crate::source::SourceRequest;

const PROTOBUF_VERSION: &str = "3.6.1";

/// `http://releases.llvm.org/<v>/<project>-<v>.src.tar.xz`
pub fn llvm_release_url(version: &LlvmVersion, project: &str) -> String {
    let long = version.long();
    format!("http://releases.llvm.org/{long}/{project}-{long}.src.tar.xz")
}

/// Value for `LLVM_TARGETS_TO_BUILD`.
pub fn llvm_targets(platform: Platform) -> &'static str {
    match platform {
        Platform::Windows => "X86",
        _ => "X86;AArch64;Sparc",
    }
}

/// Where an LLVM install keeps its CMake package.
pub fn llvm_cmake_dir(llvm_prefix: &Path) -> PathBuf {
    llvm_prefix.join("lib").join("cmake").join("llvm")
}

fn intrusive_ref_cnt_ptr(llvm_tree: &Path) -> PathBuf {
    llvm_tree
        .join("include")
        .join("llvm")
        .join("ADT")
        .join("IntrusiveRefCntPtr.h")
}

/// A release tarball unpacked into `sources/`.
fn llvm_source<'a>(env: &'a InstallEnv<'_>, project: &str) -> SourceRequest<'a> {
    let version = env.config.llvm_version();
    SourceRequest::archive(
        llvm_release_url(version, project),
        &env.dirs.sources,
        format!("{project}-{}.src", version.long()),
    )
    .file_name(format!("{project}-{}.tar.xz", version.token()))
}

/// A CMake project installed under its own name, whichever package drives it.
fn project(env: &InstallEnv<'_>, name: &str, source_dir: &Path) -> CMakeBuild {
    CMakeBuild::new(env, source_dir)
        .name(name)
        .build_dir(env.dirs.build_dir(name))
        .prefix(env.prefix_of(name))
}

pub(crate) fn llvm(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    let version = env.config.llvm_version();
    let use_libcxx = env.config.include_libcxx() && env.platform() != Platform::Windows;

    let tree = env.acquire(&llvm_source(env, "llvm"))?;

    if use_libcxx {
        for subproject in ["libcxx", "libcxxabi"] {
            let request =
                llvm_source(env, subproject).target(tree.dir.join("projects").join(subproject));
            env.acquire(&request)?;
        }
    } else {
        env.notice("Excluding libc++");
    }

    if version.is_older_than(4, 0, 1) {
        env.apply_patch(&tree.dir, &intrusive_ref_cnt_ptr(&tree.dir), "llvm")?;
    }

    let mut build = CMakeBuild::new(env, &tree.dir)
        .build_dir(env.dirs.build_dir(&format!("llvm-{}", version.token())))
        .define("CMAKE_CXX_STANDARD", 11)
        .define("LLVM_TARGETS_TO_BUILD", llvm_targets(env.platform()))
        .define("LLVM_ENABLE_RTTI", "ON")
        .define("LLVM_INCLUDE_EXAMPLES", "OFF")
        .define("LLVM_INCLUDE_TESTS", "OFF");

    if use_libcxx {
        build = if version.is_older_than(3, 7, 1) {
            build.define("LIBCXX_ENABLE_SHARED", "NO")
        } else {
            build
                .define("LIBCXX_ENABLE_STATIC", "YES")
                .define("LIBCXX_ENABLE_SHARED", "YES")
                .define("LIBCXX_ENABLE_EXPERIMENTAL_LIBRARY", "YES")
                .define("LIBCXX_ENABLE_FILESYSTEM", "YES")
                .define("LIBCXX_INCLUDE_BENCHMARKS", "NO")
        };
    }

    if env.platform() == Platform::Macos {
        build = build
            .define("LLVM_CREATE_XCODE_TOOLCHAIN", "ON")
            .define("DEFAULT_SYSROOT", "/Library/Developer/CommandLineTools/SDKs/MacOSX.sdk");
    }

    build.run(env)?;
    Ok(Exports::new().with(Export::LlvmDir, llvm_cmake_dir(&env.prefix())))
}

/// Standalone clang built against an installed LLVM.
pub(crate) fn clang(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    let version = env.config.llvm_version();

    let llvm_dir = env
        .exports
        .get(Export::LlvmDir)
        .map_or_else(|| llvm_cmake_dir(&env.prefix_of("llvm")), Path::to_path_buf);
    if !llvm_dir.is_dir() {
        return Err(InstallError::context(
            "LLVM is not installed",
            format!("{} does not exist", llvm_dir.display()),
        ));
    }
    let llvm_prefix = llvm_dir
        .ancestors()
        .nth(3)
        .map_or_else(|| env.prefix_of("llvm"), Path::to_path_buf);
    let exe = env.platform().exe_suffix();

    let archive = format!("clang-{}.tar.xz", version.token());
    let tree = env.acquire(&llvm_source(env, "cfe").file_name(archive))?;

    CMakeBuild::new(env, &tree.dir)
        .build_dir(env.dirs.build_dir(&format!("clang-{}", version.token())))
        .define("CMAKE_CXX_STANDARD", 11)
        .define("LLVM_DIR", llvm_dir.display())
        .define("LLVM_CONFIG", llvm_prefix.join("bin").join(format!("llvm-config{exe}")).display())
        .define("CLANG_INCLUDE_TESTS", "OFF")
        .run(env)?;

    let bin = env.prefix().join("bin");
    Ok(Exports::new()
        .with(Export::CCompiler, bin.join(format!("clang{exe}")))
        .with(Export::CxxCompiler, bin.join(format!("clang++{exe}"))))
}

pub(crate) fn capstone(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    let tree = env.acquire_github("aquynh", "capstone")?;
    project(env, "capstone", &tree.dir)
        .define("CMAKE_EXE_LINKER_FLAGS", "-g")
        .define("CMAKE_C_FLAGS", "-g")
        .define("CAPSTONE_SPARC_SUPPORT", 1)
        .define("CAPSTONE_BUILD_STATIC", "ON")
        .define("CAPSTONE_BUILD_DIET", "OFF")
        .define("CAPSTONE_BUILD_SHARED", "OFF")
        .define("CAPSTONE_BUILD_TESTS", "OFF")
        .run(env)?;
    Ok(Exports::new())
}

pub(crate) fn gflags(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    let tree = env.acquire_github("gflags", "gflags")?;
    project(env, "gflags", &tree.dir)
        .define("CMAKE_CXX_STANDARD", 11)
        .define("CMAKE_POSITION_INDEPENDENT_CODE", "ON")
        .define("GFLAGS_BUILD_TESTING", "OFF")
        .define("GFLAGS_BUILD_SHARED_LIBS", "OFF")
        .define("GFLAGS_BUILD_STATIC_LIBS", "ON")
        .define("GFLAGS_NAMESPACE", "google")
        .run(env)?;
    Ok(Exports::new())
}

pub(crate) fn glog(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    let tree = env.acquire_github("google", "glog")?;
    project(env, "glog", &tree.dir)
        .define("CMAKE_CXX_STANDARD", 11)
        .define("BUILD_TESTING", "OFF")
        .define("WITH_GFLAGS", "OFF")
        .define("CMAKE_POSITION_INDEPENDENT_CODE", "ON")
        .define("CMAKE_EXE_LINKER_FLAGS", "-g")
        .define("CMAKE_C_FLAGS", "-g")
        .run(env)?;
    Ok(Exports::new())
}

pub(crate) fn googletest(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    let tree = env.acquire_github("google", "googletest")?;
    project(env, "googletest", &tree.dir)
        .define("CMAKE_CXX_STANDARD", 11)
        .define("CMAKE_POSITION_INDEPENDENT_CODE", "ON")
        .without_clang_toolset()
        .run(env)?;
    Ok(Exports::new())
}

pub(crate) fn protobuf(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    let request = SourceRequest::archive(
        format!("https://github.com/protocolbuffers/protobuf/archive/v{PROTOBUF_VERSION}.tar.gz"),
        &env.dirs.sources,
        format!("protobuf-{PROTOBUF_VERSION}"),
    )
    .file_name(format!("protobuf-{PROTOBUF_VERSION}.tar.gz"));
    let tree = env.acquire(&request)?;

    project(env, "protobuf", &tree.dir.join("cmake"))
        .define("BUILD_SHARED_LIBS", "OFF")
        .define("protobuf_BUILD_TESTS", "OFF")
        .define("CMAKE_POSITION_INDEPENDENT_CODE", "ON")
        .define("protobuf_WITH_ZLIB", "OFF")
        .without_clang_toolset()
        .run(env)?;

    let protoc = env
        .prefix_of("protobuf")
        .join("bin")
        .join(format!("protoc{}", env.platform().exe_suffix()));
    Ok(Exports::new().with(Export::Protoc, protoc))
}

pub(crate) fn capnproto(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    let tree = env.acquire_github("capnproto", "capnproto")?;
    project(env, "capnproto", &tree.dir)
        .define("CMAKE_CXX_STANDARD", 11)
        .define("CMAKE_CXX_EXTENSIONS", "ON")
        .define("BUILD_TESTING", "OFF")
        .define("EXTERNAL_CAPNP", "OFF")
        .define("CAPNP_LITE", "OFF")
        .run(env)?;
    Ok(Exports::new())
}

/// gflags, glog, googletest and protobuf, each under its own prefix.
pub(crate) fn google(env: &InstallEnv<'_>) -> Result<Exports, InstallError> {
    gflags(env)?;
    glog(env)?;
    googletest(env)?;
    protobuf(env)
}
