//! End-to-end runs against stubbed collaborators.
//!
//! The stubs are small shell scripts that create exactly the files the real
//! tools would, wired in through the `ToolPaths` seam. Unix-only because of
//! the shebang scripts.

use super::{RunState, StageSequencer, StageStatus};
use crate::config::{RunConfig, SeqType, ToolPaths};
use crate::errors::PhyloflowError;
use crate::layout::RootLayout;
use crate::tools::helper_scripts;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    scripts: PathBuf,
    bin: PathBuf,
    metadata: PathBuf,
}

fn write_executable(path: &Path, body: &str) {
    fs::write(path, body).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

/// Builds a populated prior-stage directory plus stub tools.
///
/// `empty_entropy` makes the entropy stub emit a header-only table.
fn fixture(empty_entropy: bool) -> Fixture {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("run");
    let layout = RootLayout::new(&root, SeqType::Aa);

    // Prior-stage inputs.
    let msa = layout.msa_dir();
    fs::create_dir_all(&msa).unwrap();
    fs::write(msa.join("OG1.fa"), ">s1\nMKV\n>s2\nMKL\n").unwrap();
    fs::write(msa.join("OG2.fa"), ">s1\nAAV\n>s2\nAAL\n").unwrap();
    fs::create_dir_all(layout.marker_genes_dir()).unwrap();
    fs::write(layout.marker_genes_dir().join("sample1.fa"), ">g1\nATG\n").unwrap();
    fs::write(layout.dna_reference(), ">ref\nATGC\n").unwrap();
    fs::write(layout.five_letter_file(), "Homo sapiens\tsHOMO\n").unwrap();
    fs::write(layout.og_gene_table(), "OG,gene\nOG1,E1\nOG2,NS3\n").unwrap();

    let metadata = root.join("metadata.csv");
    fs::write(
        &metadata,
        "label,accession\ncharacter,character\nSampleA,ACC1\n",
    )
    .unwrap();

    // Helper scripts only need to exist; the python stub dispatches on the
    // script name.
    let scripts = dir.path().join("scripts");
    fs::create_dir_all(&scripts).unwrap();
    for name in helper_scripts() {
        fs::write(scripts.join(name), "# stub\n").unwrap();
    }

    // Stub executables creating the artifacts the real tools would.
    let bin = dir.path().join("bin");
    fs::create_dir_all(&bin).unwrap();

    let alignment = layout
        .results_dir()
        .join("merge_all_samples")
        .join("concat_merge_aa.phy");
    write_executable(
        &bin.join("read2tree"),
        &format!(
            "#!/bin/sh\nmkdir -p '{}'\nprintf '>s1\\nMKVAAV\\n' > '{}'\n",
            alignment.parent().unwrap().display(),
            alignment.display()
        ),
    );

    let treefile = format!("{}.treefile", alignment.display());
    write_executable(
        &bin.join("iqtree2"),
        &format!("#!/bin/sh\nprintf '(s1,s2);' > '{treefile}'\n"),
    );

    let relabeled = RootLayout::relabeled_tree(Path::new(&treefile));
    let entropy_rows = if empty_entropy { "" } else { "1,OG1,E1,0.42\\n" };
    let python = format!(
        r#"#!/bin/sh
case "$1" in
  -c) exit 0 ;;
  */validate_metadata.py) exit 0 ;;
  */prepare_metadata_o2t_view.py)
    printf '(SampleA,ref);' > '{relabeled}'
    printf 'sample_id,label,source\n' > '{view_meta}'
    ;;
  */omni2treeview.py) printf 'html' > '{viz_dir}/o2t_view.html' ;;
  */msa_to_position_table.py)
    printf 'label,position,character,og,gene,seq_type\nSampleA,1,M,OG1,E1,AA\n' > '{positions}'
    ;;
  */position_entropy.py) printf 'position,og,gene,entropy\n{entropy_rows}' > '{entropy}' ;;
  */plot_entropy.py) printf 'png' > '{plots}/entropy_aa.png' ;;
  *) exit 9 ;;
esac
"#,
        relabeled = relabeled.display(),
        view_meta = layout.view_metadata().display(),
        viz_dir = layout.visualization_dir().display(),
        positions = layout.positions_table().display(),
        entropy = layout.entropy_table().display(),
        plots = layout.entropy_dir().display(),
    );
    write_executable(&bin.join("python3"), &python);

    Fixture {
        _dir: dir,
        root,
        scripts,
        bin,
        metadata,
    }
}

fn config(fixture: &Fixture) -> RunConfig {
    RunConfig::builder(&fixture.root, &fixture.metadata)
        .with_scripts_dir(&fixture.scripts)
        .with_tools(ToolPaths {
            read2tree: fixture.bin.join("read2tree"),
            iqtree: fixture.bin.join("iqtree2"),
            python: fixture.bin.join("python3"),
        })
        .build()
        .unwrap()
}

#[tokio::test]
async fn full_run_succeeds_with_default_flags() {
    let fixture = fixture(false);
    let outcome = StageSequencer::new(config(&fixture)).run().await.unwrap();

    assert_eq!(outcome.state, RunState::Done);
    assert_eq!(outcome.stages.len(), 6);
    assert!(outcome
        .stages
        .iter()
        .all(|stage| stage.status == StageStatus::Ok));
    assert_eq!(
        outcome
            .stages
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>(),
        vec![
            "combine",
            "tree-inference",
            "visualization",
            "position-table",
            "entropy",
            "plot"
        ]
    );

    let layout = RootLayout::new(&fixture.root, SeqType::Aa);
    let entropy = fs::read_to_string(layout.entropy_table()).unwrap();
    assert!(entropy.lines().count() >= 2, "entropy table has data rows");
    assert!(layout.positions_table().is_file());
    assert!(layout.view_metadata().is_file());
    assert!(layout.run_report().is_file());

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(layout.run_report()).unwrap()).unwrap();
    assert_eq!(report["state"], "done");
}

#[tokio::test]
async fn header_only_entropy_table_fails_the_run() {
    let fixture = fixture(true);
    let err = StageSequencer::new(config(&fixture)).run().await.unwrap_err();

    match err {
        PhyloflowError::PostCondition(msg) => {
            assert!(msg.contains("no data rows"));
            assert!(msg.contains("--min-samples"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_marker_genes_fails_preflight() {
    let fixture = fixture(false);
    fs::remove_dir_all(
        RootLayout::new(&fixture.root, SeqType::Aa).marker_genes_dir(),
    )
    .unwrap();

    let err = StageSequencer::new(config(&fixture)).run().await.unwrap_err();
    assert!(matches!(err, PhyloflowError::Artifact(_)));
    assert!(err.to_string().contains("marker_genes"));
}

#[tokio::test]
async fn alignment_id_missing_from_table_aborts_before_extraction() {
    let fixture = fixture(false);
    let layout = RootLayout::new(&fixture.root, SeqType::Aa);
    // Drop OG2 from the reference table while its alignment stays present.
    fs::write(layout.og_gene_table(), "OG,gene\nOG1,E1\n").unwrap();

    let err = StageSequencer::new(config(&fixture)).run().await.unwrap_err();
    match err {
        PhyloflowError::CrossValidation(inner) => {
            assert!(inner.to_string().contains("OG2"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // The extraction output was never produced.
    assert!(!layout.positions_table().exists());
}

#[tokio::test]
async fn failing_tool_aborts_the_run() {
    let fixture = fixture(false);
    write_executable(&fixture.bin.join("iqtree2"), "#!/bin/sh\nexit 3\n");

    let err = StageSequencer::new(config(&fixture)).run().await.unwrap_err();
    match err {
        PhyloflowError::ToolFailure { tool, status } => {
            assert_eq!(tool, "iqtree2");
            assert_eq!(status, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn domain_table_gate_runs_before_any_stage() {
    let fixture = fixture(false);
    let domain = fixture.root.join("domains.csv");
    fs::write(&domain, "gene,domain,start,end\nE1,TM1,0,10\n").unwrap();

    let config = RunConfig::builder(&fixture.root, &fixture.metadata)
        .with_scripts_dir(&fixture.scripts)
        .with_domain_table(&domain)
        .with_tools(ToolPaths {
            read2tree: fixture.bin.join("read2tree"),
            iqtree: fixture.bin.join("iqtree2"),
            python: fixture.bin.join("python3"),
        })
        .build()
        .unwrap();

    let err = StageSequencer::new(config).run().await.unwrap_err();
    assert!(matches!(err, PhyloflowError::CrossValidation(_)));

    // No stage ran: the combine output never appeared.
    let layout = RootLayout::new(&fixture.root, SeqType::Aa);
    assert!(!layout.results_dir().join("merge_all_samples").exists());
}
