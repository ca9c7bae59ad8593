use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use shed2tap::placeholders::{Substitutions, resolve_placeholders};
use shed2tap::{
    Action, ActionSet, Architecture, EnvironmentEdit, Mutation, Os, Package, RecipeCompiler,
    Repository, Tap,
};

fn action_set(os: Option<Os>, arch: Option<Architecture>, label: &str) -> ActionSet {
    ActionSet::new(
        os,
        arch,
        vec![
            Action::DownloadByUrl {
                url: format!("http://example.org/{}.tar.gz", label),
            },
            Action::ShellCommand {
                command: format!("./configure --prefix=$INSTALL_DIR --target={}", label),
            },
            Action::MakeInstall,
            Action::SetEnvironment {
                variables: vec![
                    EnvironmentEdit::new(Mutation::Prepend, "PATH", "$INSTALL_DIR/bin"),
                    EnvironmentEdit::new(Mutation::Set, "TOOL_HOME", "$INSTALL_DIR"),
                ],
            },
        ],
    )
}

fn multi_branch_package() -> Package {
    Package {
        name: "bench".to_string(),
        version: "1.0".to_string(),
        readme: Some("Benchmark package.".to_string()),
        shared_repository: false,
        sub_dependencies: vec![],
        action_sets: vec![
            action_set(Some(Os::Linux), Some(Architecture::X86_64), "linux64"),
            action_set(Some(Os::Linux), Some(Architecture::I386), "linux32"),
            action_set(Some(Os::Darwin), None, "mac"),
            action_set(None, None, "source"),
        ],
        repository: Repository::new("https://toolshed.g2.bx.psu.edu", "devteam", "package_bench"),
    }
}

fn bench_compile(c: &mut Criterion) {
    let compiler = RecipeCompiler::new(Tap::parse("jmchilton/toolshed").unwrap());
    let package = multi_branch_package();

    c.bench_function("compile multi-branch", |b| {
        b.iter(|| compiler.compile(black_box(&package)))
    });

    let mut group = c.benchmark_group("compile by branch count");
    for count in [1usize, 2, 4] {
        let mut pkg = multi_branch_package();
        pkg.action_sets.drain(..pkg.action_sets.len() - count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &pkg, |b, pkg| {
            b.iter(|| compiler.compile(black_box(pkg)))
        });
    }
    group.finish();
}

fn bench_placeholders(c: &mut Criterion) {
    let subs = Substitutions::default();
    c.bench_function("resolve_placeholders", |b| {
        b.iter(|| {
            resolve_placeholders(
                black_box("cp -r $INSTALL_DIR/lib ${INSTALL_DIR}/share && echo $$HOME"),
                &subs,
            )
        })
    });
}

criterion_group!(benches, bench_compile, bench_placeholders);
criterion_main!(benches);
