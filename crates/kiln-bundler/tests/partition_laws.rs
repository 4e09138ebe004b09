//! Property tests for the chunk partitioner.
//!
//! Random graphs over `src/m{i}.js` with random static and dynamic edges,
//! partitioned by random rule tables.

use std::collections::HashMap;

use kiln_bundler::chunks::{ChunkRule, PartitionOptions, RUNTIME_MODULE, partition};
use kiln_config::{ChunkRuleConfig, ChunkScope, ChunkTest, PathRegistry, PathsConfig};
use kiln_graph::{AssetKind, Dependency, ImportKind, Module, ModuleGraph, ModuleId};
use proptest::prelude::*;

const MAX_MODULES: usize = 10;

#[derive(Debug, Clone)]
struct GraphSpec {
    modules: usize,
    edges: Vec<(usize, usize, bool)>,
    dependency: Vec<bool>,
}

#[derive(Debug, Clone)]
struct RuleSpec {
    members: Vec<bool>,
    dependencies: bool,
    priority: i32,
}

fn id(i: usize) -> ModuleId {
    ModuleId::new(format!("src/m{i}.js"))
}

fn graph_strategy() -> impl Strategy<Value = GraphSpec> {
    (2usize..=MAX_MODULES).prop_flat_map(|n| {
        (
            prop::collection::vec((0..n, 0..n, any::<bool>()), 0..n * 3),
            prop::collection::vec(any::<bool>(), n),
        )
            .prop_map(move |(edges, dependency)| GraphSpec {
                modules: n,
                edges,
                dependency,
            })
    })
}

fn rules_strategy() -> impl Strategy<Value = Vec<RuleSpec>> {
    prop::collection::vec(
        (
            prop::collection::vec(any::<bool>(), MAX_MODULES),
            prop::bool::weighted(0.25),
            -3i32..=3,
        )
            .prop_map(|(members, dependencies, priority)| RuleSpec {
                members,
                dependencies,
                priority,
            }),
        0..4,
    )
}

fn build_graph(spec: &GraphSpec) -> ModuleGraph {
    let mut graph = ModuleGraph::new();
    for i in 0..spec.modules {
        let module = Module::new(id(i), format!("/p/src/m{i}.js"), AssetKind::Script)
            .dependency(spec.dependency[i] && i != 0);
        graph.add_module(module);
    }
    graph.set_entry(id(0));
    for &(from, to, dynamic) in &spec.edges {
        if from == to {
            continue;
        }
        let kind = if dynamic {
            ImportKind::Dynamic
        } else {
            ImportKind::Static
        };
        graph.add_dependency(
            &id(from),
            Dependency {
                specifier: format!("./m{to}.js"),
                target: id(to),
                kind,
            },
        );
    }
    graph
}

fn rule_configs(specs: &[RuleSpec]) -> Vec<ChunkRuleConfig> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| {
            let test = if spec.dependencies {
                ChunkTest::Dependencies
            } else {
                let members: Vec<String> = spec
                    .members
                    .iter()
                    .enumerate()
                    .filter(|(_, member)| **member)
                    .map(|(i, _)| i.to_string())
                    .collect();
                if members.is_empty() {
                    ChunkTest::Regex("^$".into())
                } else {
                    ChunkTest::Regex(format!(r"^src/m({})\.js$", members.join("|")))
                }
            };
            ChunkRuleConfig {
                name: format!("r{index}"),
                test,
                priority: spec.priority,
                scope: ChunkScope::All,
                min_chunks: 1,
            }
        })
        .collect()
}

fn compile(specs: &[RuleSpec]) -> Vec<ChunkRule> {
    let registry = PathRegistry::new("/p", &PathsConfig::default()).unwrap();
    ChunkRule::compile_all(&rule_configs(specs), &registry).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every reachable module lands in exactly one non-runtime chunk;
    /// nothing unreachable is kept; the runtime chunk holds only the
    /// bootstrap.
    #[test]
    fn prop_totality_and_exclusivity(graph in graph_strategy(), rules in rules_strategy()) {
        let graph = build_graph(&graph);
        let chunks = partition(&graph, &compile(&rules), &PartitionOptions::default());

        let mut seen: HashMap<ModuleId, usize> = HashMap::new();
        for chunk in chunks.iter() {
            prop_assert!(!chunk.modules.is_empty(), "empty chunk {}", chunk.name);
            for module in &chunk.modules {
                *seen.entry(module.clone()).or_default() += 1;
            }
        }

        let runtime = chunks.runtime().expect("runtime chunk");
        prop_assert_eq!(&runtime.modules, &vec![ModuleId::new(RUNTIME_MODULE)]);
        prop_assert_eq!(seen.remove(&ModuleId::new(RUNTIME_MODULE)), Some(1));

        let reachable = graph.reachable();
        prop_assert_eq!(seen.len(), reachable.len());
        for module in &reachable {
            prop_assert_eq!(seen.get(module).copied(), Some(1), "{} placed once", module);
        }
    }

    /// With only the entry as a root, the first rule in evaluation order
    /// that matches a module owns it; unmatched modules stay with the entry.
    #[test]
    fn prop_priority_and_declaration_order(graph in graph_strategy(), rules in rules_strategy()) {
        let graph = build_graph(&graph);
        let compiled = compile(&rules);
        let options = PartitionOptions {
            lazy_chunks: false,
            runtime_chunk: true,
        };
        let chunks = partition(&graph, &compiled, &options);
        let entry = chunks.entry().expect("entry chunk").name.clone();

        for module_id in graph.reachable() {
            if Some(&module_id) == graph.entry() {
                prop_assert_eq!(&chunks.chunk_of(&module_id).unwrap().name, &entry);
                continue;
            }
            let module = graph.get(&module_id).unwrap();
            let expected = compiled
                .iter()
                .find(|rule| rule.matches(module))
                .map(ChunkRule::chunk_name)
                .unwrap_or_else(|| entry.clone());
            prop_assert_eq!(&chunks.chunk_of(&module_id).unwrap().name, &expected);
        }
    }

    /// Partitioning is a pure function of its inputs.
    #[test]
    fn prop_deterministic(graph in graph_strategy(), rules in rules_strategy()) {
        let graph = build_graph(&graph);
        let compiled = compile(&rules);
        let first = partition(&graph, &compiled, &PartitionOptions::default());
        let second = partition(&graph, &compiled, &PartitionOptions::default());
        prop_assert_eq!(first.load_order(), second.load_order());
        for (a, b) in first.iter().zip(second.iter()) {
            prop_assert_eq!(&a.modules, &b.modules);
        }
    }
}
