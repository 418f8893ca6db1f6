mod util;

use ndarray::array;
use pretty_assertions::assert_eq;
use std::ffi::OsString;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use roicifti::batch::{run_with, BatchSummary};
use roicifti::cifti::{BrainStructure, CiftiAxis, CiftiImage, ScalarAxis};
use roicifti::processor::{FileProcessor, FileSystemIo};
use roicifti::{Config, ConvertError};

use util::{template_axis, write_gifti, write_template, RecordingRunner};

type TestProcessor = FileProcessor<FileSystemIo, RecordingRunner>;

fn processor(config: &Config, runner: RecordingRunner) -> TestProcessor {
    FileProcessor::with_parts(config, FileSystemIo, runner)
}

#[test]
fn left_roi_end_to_end() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("in");
    let output = dir.path().join("out");
    fs::create_dir(&input).unwrap();
    let template = write_template(dir.path(), "template.dscalar.nii");
    let _ = write_gifti(&input, "Subject1_LEFT.func.gii", &[vec![0., 1., 0., 0., 1.]]);

    let config = Config::new(&template, "wb_command")
        .input_dir(&input)
        .output_dir(&output);
    let runner = RecordingRunner::exiting_with(0);
    let summary = run_with(&config, &processor(&config, runner.clone())).unwrap();
    assert_eq!(
        summary,
        BatchSummary {
            seen: 1,
            converted: 1,
            failed: 0,
            densify_failures: 0,
        }
    );

    let grid = output.join("Subject1_LEFT.dscalar.nii");
    let image = CiftiImage::from_file(&grid).unwrap();
    assert_eq!(image.data(), &array![[0f32, 1., 0., 0., 1.]]);
    assert_eq!(
        image.header().axis(0),
        Some(&CiftiAxis::Scalars(ScalarAxis::new(vec!["ROI_Mask"])))
    );
    let axis = image.header().brain_model_axis(1).unwrap();
    assert_eq!(axis, &template_axis().restrict_to(BrainStructure::CortexLeft));
    assert_eq!(axis.surface_vertex_count(BrainStructure::CortexLeft), Some(5));
    assert!(axis.volume().is_some());

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    let expected: Vec<OsString> = vec![
        "-cifti-create-dense-from-template".into(),
        template.clone().into(),
        output.join("Subject1_LEFT_Full.dscalar.nii").into(),
        "-cifti".into(),
        grid.into(),
    ];
    assert_eq!(calls[0], expected);
}

#[test]
fn right_roi_uses_right_cortex_positions() {
    let dir = tempdir().unwrap();
    let template = write_template(dir.path(), "template.dscalar.nii");
    let _ = write_gifti(
        dir.path(),
        "sub-02_right_roi.func.gii",
        &[vec![1., 0., 0., 0.], vec![0., 0., 1., 0.]],
    );

    let config = Config::new(&template, "wb_command")
        .input_dir(dir.path())
        .output_dir(dir.path().join("out"));
    let summary = run_with(&config, &processor(&config, RecordingRunner::default())).unwrap();
    assert_eq!(summary.converted, 1);

    let image = CiftiImage::from_file(dir.path().join("out/sub-02_right_roi.dscalar.nii")).unwrap();
    // right cortex vertices are [0, 2, 3]
    assert_eq!(image.data(), &array![[1f32, 1., 0.]]);
}

#[test]
fn unresolved_hemisphere_is_skipped() {
    let dir = tempdir().unwrap();
    let template = write_template(dir.path(), "template.dscalar.nii");
    let _ = write_gifti(dir.path(), "roiX.func.gii", &[vec![1., 1., 1., 1., 1.]]);
    let _ = write_gifti(dir.path(), "roi_LEFT.func.gii", &[vec![1., 1., 1., 1., 1.]]);

    let out = dir.path().join("out");
    let config = Config::new(&template, "wb_command")
        .input_dir(dir.path())
        .output_dir(&out);
    let runner = RecordingRunner::exiting_with(0);
    let summary = run_with(&config, &processor(&config, runner.clone())).unwrap();
    assert_eq!(summary.seen, 2);
    assert_eq!(summary.converted, 1);
    assert_eq!(summary.failed, 1);
    assert!(!out.join("roiX.dscalar.nii").exists());
    assert!(out.join("roi_LEFT.dscalar.nii").exists());
    assert_eq!(runner.calls.borrow().len(), 1);

    let image = CiftiImage::from_file(out.join("roi_LEFT.dscalar.nii")).unwrap();
    assert_eq!(image.data(), &array![[1f32, 1., 1., 1., 1.]]);
}

#[test]
fn failing_tool_keeps_grid_file() {
    let dir = tempdir().unwrap();
    let template = write_template(dir.path(), "template.dscalar.nii");
    let _ = write_gifti(dir.path(), "a_LEFT.func.gii", &[vec![0.; 5]]);

    let out = dir.path().join("out");
    let config = Config::new(&template, "wb_command")
        .input_dir(dir.path())
        .output_dir(&out);
    let p = processor(&config, RecordingRunner::exiting_with(1));
    let summary = run_with(&config, &p).unwrap();
    assert_eq!(summary.converted, 1);
    assert_eq!(summary.densify_failures, 1);
    assert!(out.join("a_LEFT.dscalar.nii").exists());
    assert!(!out.join("a_LEFT_Full.dscalar.nii").exists());

    let image = CiftiImage::from_file(out.join("a_LEFT.dscalar.nii")).unwrap();
    assert!(image.data().iter().all(|v| *v == 0.));
}

#[test]
fn only_func_gii_files_are_considered() {
    let dir = tempdir().unwrap();
    let template = write_template(dir.path(), "template.dscalar.nii");
    let _ = write_gifti(dir.path(), "a_LEFT.shape.gii", &[vec![1.; 5]]);
    let _ = write_gifti(dir.path(), "a_LEFT.func.gii.bak", &[vec![1.; 5]]);
    fs::create_dir(dir.path().join("nested_LEFT.func.gii")).unwrap();

    let config = Config::new(&template, "wb_command")
        .input_dir(dir.path())
        .output_dir(dir.path().join("out"));
    let summary = run_with(&config, &processor(&config, RecordingRunner::default())).unwrap();
    assert_eq!(summary, BatchSummary::default());
}

#[test]
fn conversion_is_deterministic() {
    let dir = tempdir().unwrap();
    let template = write_template(dir.path(), "template.dscalar.nii");
    let input = dir.path().join("in");
    fs::create_dir(&input).unwrap();
    let _ = write_gifti(&input, "s_LEFT.func.gii", &[vec![0., 1., 1., 0., 1.]]);

    let mut outputs = Vec::new();
    for out in &["out1", "out2"] {
        let config = Config::new(&template, "wb_command")
            .input_dir(&input)
            .output_dir(dir.path().join(out));
        let _ = run_with(&config, &processor(&config, RecordingRunner::default())).unwrap();
        outputs.push(fs::read(dir.path().join(out).join("s_LEFT.dscalar.nii")).unwrap());
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn absent_hemisphere_in_template_fails_the_file() {
    let dir = tempdir().unwrap();
    let mut axis = template_axis().restrict_to(BrainStructure::CortexLeft);
    axis.add_voxels(BrainStructure::ThalamusLeft, &[[0, 0, 0]]).unwrap();
    let header = roicifti::CiftiHeader::dense_scalar(ScalarAxis::new(vec!["t"]), axis);
    let template = dir.path().join("left_only.dscalar.nii");
    CiftiImage::new(header, ndarray::Array2::zeros((1, 6)))
        .unwrap()
        .write(&template)
        .unwrap();
    let _ = write_gifti(dir.path(), "s_RIGHT.func.gii", &[vec![1.; 4]]);

    let config = Config::new(&template, "wb_command")
        .input_dir(dir.path())
        .output_dir(dir.path().join("out"));
    let p = processor(&config, RecordingRunner::default());
    match p.process(&dir.path().join("s_RIGHT.func.gii")) {
        Err(ConvertError::HemisphereAbsent(BrainStructure::CortexRight)) => {}
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn unreadable_inputs_are_reported_per_file() {
    let dir = tempdir().unwrap();
    let template = write_template(dir.path(), "template.dscalar.nii");
    fs::write(dir.path().join("broken_LEFT.func.gii"), "<GIFTI><DataArray").unwrap();

    let config = Config::new(&template, "wb_command")
        .input_dir(dir.path())
        .output_dir(dir.path().join("out"));
    let p = processor(&config, RecordingRunner::default());
    match p.process(&dir.path().join("broken_LEFT.func.gii")) {
        Err(ConvertError::SourceLoad(..)) => {}
        other => panic!("unexpected {:?}", other),
    }

    let config = Config::new(dir.path().join("missing.dscalar.nii"), "wb_command")
        .input_dir(dir.path())
        .output_dir(dir.path().join("out"));
    let _ = write_gifti(dir.path(), "ok_LEFT.func.gii", &[vec![1.; 5]]);
    let summary = run_with(&config, &processor(&config, RecordingRunner::default())).unwrap();
    assert_eq!(summary.seen, 2);
    assert_eq!(summary.failed, 2);
}

#[test]
fn missing_input_directory_aborts() {
    let dir = tempdir().unwrap();
    let config = Config::new("t.dscalar.nii", "wb_command")
        .input_dir(dir.path().join("nope"))
        .output_dir(dir.path().join("out"));
    let res = run_with(&config, &processor(&config, RecordingRunner::default()));
    assert!(matches!(res, Err(ConvertError::Io(_))));
    assert!(dir.path().join("out").is_dir());
}

#[cfg(unix)]
#[test]
fn spawned_tool_exit_status() {
    let dir = tempdir().unwrap();
    let template = write_template(dir.path(), "template.dscalar.nii");
    let _ = write_gifti(dir.path(), "s_LEFT.func.gii", &[vec![1.; 5]]);

    for (tool, failures) in &[("true", 0), ("false", 1)] {
        let config = Config::new(&template, Path::new(tool))
            .input_dir(dir.path())
            .output_dir(dir.path().join(tool));
        let summary = roicifti::batch::run(&config).unwrap();
        assert_eq!(summary.converted, 1);
        assert_eq!(summary.densify_failures, *failures);
    }
}
