/// Selection parser: grid → [`PlotSpec`].
///
/// Pipeline:
/// ```text
///   Selection
///       │
///       ▼
///   ┌──────────┐
///   │ classify  │  one RowRole per row, stops at the data block
///   └──────────┘
///       │
///       ▼
///   ┌──────────┐
///   │  header   │  labels / units / legend / schema + directives
///   └──────────┘
///       │
///       ▼
///   ┌──────────┐
///   │  schema   │  X/Y/error pairing, layer registry
///   └──────────┘
///       │
///       ▼
///   ┌──────────┐
///   │ extract   │  cleaned numeric series per dataset
///   └──────────┘
/// ```
pub mod classify;
pub mod coerce;
pub mod directive;
pub mod header;
pub mod schema;
pub mod split;

use crate::config::ParseConfig;
use crate::data::extract::build_dataset;
use crate::data::model::Selection;
use crate::error::ParseError;
use crate::spec::PlotSpec;

/// Turn one selection into a plot specification. Any error aborts the whole
/// parse; no partial spec is returned.
pub fn parse_selection(selection: &Selection, config: &ParseConfig) -> Result<PlotSpec, ParseError> {
    header::check_shape(selection)?;
    let roles = classify::classify_rows(selection)?;
    let normalized = header::normalize(selection, &roles, config)?;
    let interpretation = schema::interpret(&normalized.header)?;

    let data = &normalized.data;
    let datasets: Vec<_> = interpretation
        .bindings
        .into_iter()
        .map(|binding| build_dataset(data, binding))
        .collect();

    let directives = normalized.directives;
    log::info!(
        "parsed {} datasets on {} layers from {} data rows",
        datasets.len(),
        interpretation.layers.len(),
        data.len()
    );

    Ok(PlotSpec {
        title: directives.title,
        settings: directives.settings,
        layers: interpretation.layers,
        datasets,
        directives: directives.commands,
        legend_enabled: directives.legend_enabled,
        output: directives.output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;
    use crate::error::ErrorKind;
    use crate::spec::{Axis, Corner, Directive, OutputMode, Placement};

    fn parse(records: &[&[&str]]) -> Result<PlotSpec, ParseError> {
        let selection = Selection::from_records(records.iter().map(|r| r.iter()));
        parse_selection(&selection, &ParseConfig::default())
    }

    #[test]
    fn test_complete_selection() {
        let spec = parse(&[
            &["title", "Ring-down", "", "", "", ""],
            &["settings", "grid", "", "", "", ""],
            &["show", "", "", "", "", ""],
            &["add_hline", "0", "color=gray", "", "", ""],
            &["Time", "Amplitude", "", "Amplitude", "Freq", "Power"],
            &["ms", "mV", "", "mV", "kHz", "dB"],
            &["", "cavity", "", "reference", "", "spectrum"],
            &["X", "Y;;color=red", "Yerr", "Y", "X;insettr", "Y;insettr;color=blue"],
            &["0", "5", "0.1", "4", "1", "-3"],
            &["1", "3", "0.2", "2.5", "2", "-6"],
            &["2", "1", "0.1", "1", "", ""],
            &["", "", "", "", "", ""],
        ])
        .unwrap();

        assert_eq!(spec.title.as_deref(), Some("Ring-down"));
        assert_eq!(spec.settings[0].name, "grid");
        assert_eq!(spec.output, OutputMode::Display);
        assert!(spec.legend_enabled);
        assert_eq!(
            spec.directives,
            vec![Directive::ReferenceLine {
                layer: "main".into(),
                axis: Axis::Y,
                value: 0.0,
                color: Some("gray".into())
            }]
        );

        let names: Vec<_> = spec.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["main", "inset-top-right"]);
        let main = spec.layer("main").unwrap();
        assert_eq!((main.x_label.as_str(), main.y_unit.as_str()), ("Time", "mV"));
        assert_eq!(main.color.as_deref(), Some("red"));
        let inset = spec.layer("inset-top-right").unwrap();
        assert_eq!(inset.placement, Placement::Inset(Corner::TopRight));
        assert_eq!((inset.x_label.as_str(), inset.y_unit.as_str()), ("Freq", "dB"));

        assert_eq!(spec.datasets.len(), 3);
        let cavity = &spec.datasets[0];
        assert_eq!(cavity.label.as_deref(), Some("cavity"));
        assert_eq!(cavity.y, vec![5.0, 3.0, 1.0]);
        assert_eq!(cavity.y_err, Some(vec![0.1, 0.2, 0.1]));
        assert_eq!(cavity.style.get("color"), Some(&Value::Text("red".into())));

        let reference = &spec.datasets[1];
        assert_eq!((reference.x_column, reference.y_column), (0, 3));
        assert_eq!(reference.y_err, None);

        let spectrum = &spec.datasets[2];
        assert_eq!(spectrum.layer, "inset-top-right");
        assert_eq!(spectrum.x, vec![1.0, 2.0]);
        assert_eq!(spec.datasets_on("inset-top-right").count(), 1);
    }

    #[test]
    fn test_bare_data_block() {
        let spec = parse(&[&["1", "2", "3", "4"], &["2", "4", "6", "8"]]).unwrap();
        assert_eq!(spec.datasets.len(), 2);
        assert_eq!(spec.datasets[1].x, vec![3.0, 6.0]);
        assert_eq!(spec.layers.len(), 1);
        assert_eq!(spec.output, OutputMode::SaveTemporaryImage);
        assert!(!spec.legend_enabled);
        assert_eq!(spec.title, None);
    }

    #[test]
    fn test_unknown_layer_aborts_parse() {
        let err = parse(&[&["X", "Y;bogus"], &["1", "2"], &["2", "3"]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_structural_errors() {
        let ragged = Selection::new(vec![
            vec!["x".into(), "y".into()],
            vec![1.0.into()],
            vec![2.0.into(), 3.0.into()],
        ]);
        let err = parse_selection(&ragged, &ParseConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);

        assert_eq!(parse(&[&["Time", "Counts"]]).unwrap_err(), ParseError::NoDataRows);
        assert_eq!(
            parse(&[&["Y", "X"], &["1", "2"], &["2", "3"]]).unwrap_err(),
            ParseError::YWithoutX { column: 0 }
        );
    }

    #[test]
    fn test_directive_error_aborts_parse() {
        let err = parse(&[&["add_arrow", "1"], &["1", "2"], &["2", "3"]]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Directive);
    }

    #[test]
    fn test_twin_layer_from_alias() {
        let spec = parse(&[
            &["T", "P", "V"],
            &["X", "Y", "Y;TwinX"],
            &["1", "2", "3"],
            &["2", "3", "4"],
        ])
        .unwrap();
        let twin = spec.layer("twin-x").unwrap();
        assert_eq!(twin.placement, Placement::Twin(Axis::X));
        assert_eq!((twin.x_label.as_str(), twin.y_label.as_str()), ("T", "V"));
    }

    #[test]
    fn test_header_text_is_kept_as_written() {
        let spec = parse(&[
            &["title", "2.10", "", ""],
            &["Time", "1.10", "Time", "007"],
            &["s", "V", "s", "V"],
            &["", "0.50", "", "1e3"],
            &["X", "Y", "X", "Y"],
            &["1", "2", "3", "4"],
            &["2", "3", "4", "5"],
        ])
        .unwrap();
        assert_eq!(spec.title.as_deref(), Some("2.10"));
        assert_eq!(spec.layers[0].y_label, "1.10");
        let labels: Vec<_> = spec.datasets.iter().map(|d| d.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("0.50"), Some("1e3")]);
        assert_eq!(spec.datasets[1].x, vec![3.0, 4.0]);
    }

    #[test]
    fn test_skip_sentinel_in_first_column_is_a_label_row() {
        // Without a kind token in column 1 the row is free text, so the
        // default X,Y,... pairing applies.
        let spec = parse(&[
            &["skip", "X", "Y", "Y"],
            &["1", "2", "3", "4"],
            &["2", "3", "4", "5"],
        ])
        .unwrap();
        let columns: Vec<_> = spec.datasets.iter().map(|d| (d.x_column, d.y_column)).collect();
        assert_eq!(columns, vec![(0, 1), (2, 3)]);
        assert_eq!(spec.layers[0].x_label, "skip");
    }
}
