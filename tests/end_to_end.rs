use gerber_offset::spacial::length;
use gerber_offset::testing::{assert_near, assert_position_near, gerber_program};
use gerber_offset::{
    parse, Command, Exposure, FormatError, GeometryKind, ParseWarningKind, Position, Realizer, ScaleTransformer,
};

fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .try_init();
}

#[test]
fn flashed_circle_is_realized_at_its_position() {
    // given
    init_logging();
    let text = gerber_program("%ADD10C,1.0*%\nD10*\nX100000Y100000D03*");

    // when
    let file = parse(&text).unwrap();
    let geometries = Realizer::default().realize_all(&file.commands);

    // then
    assert!(file.warnings.is_empty(), "{:?}", file.warnings);
    assert_eq!(geometries.len(), 1);
    let circle = &geometries[0];
    assert_eq!(circle.kind(), GeometryKind::FlashAperture);
    assert_eq!(circle.points().len(), 128);
    for point in circle.points() {
        assert_near(length(*point - Position::new(10.0, 10.0)), 0.5);
    }
    assert_position_near(circle.center().unwrap(), Position::new(10.0, 10.0));
}

#[test]
fn region_has_one_point_per_draw() {
    // given
    init_logging();
    let text = gerber_program("G36*\nX0Y0D02*\nX50000Y0D01*\nX50000Y50000D01*\nX0Y50000D01*\nG37*");

    // when
    let file = parse(&text).unwrap();

    // then
    let [Command::Region {
        polygon,
    }] = file.commands.as_slice()
    else {
        panic!("expected a single region, got {:?}", file.commands);
    };
    assert_eq!(polygon, &vec![Position::new(5.0, 0.0), Position::new(5.0, 5.0), Position::new(0.0, 5.0)]);
}

#[test]
fn inch_file_is_realized_in_millimeters() {
    // given
    init_logging();
    let text = "%FSLAX24Y24*%\n%MOIN*%\n%ADD10R,0.1X0.05*%\nD10*\nX10000Y10000D03*\nM02*\n";

    // when
    let file = parse(text).unwrap();
    let geometries = Realizer::default().realize_all(&file.commands);

    // then
    let bounds = geometries[0].bounding_box();
    assert_near(bounds.width(), 2.54);
    assert_near(bounds.height(), 1.27);
    assert_position_near(bounds.center(), Position::new(25.4, 25.4));
}

#[test]
fn mixed_artwork_is_transformed() {
    // given
    init_logging();
    let text = gerber_program(concat!(
        "%AMDONUT*\n1,1,$1,0,0*\n1,0,$2,0,0*%\n",
        "%ADD10C,0.2*%\n",
        "%ADD11O,2.0X1.0*%\n",
        "%ADD20DONUT,1.0X0.5*%\n",
        "D10*\n",
        "X10000Y0D02*\n",
        "G03X0Y10000I-10000J0D01*\n",
        "G01X-10000Y10000D01*\n",
        "D11*\n",
        "X200000Y200000D03*\n",
        "D20*\n",
        "X-200000Y-200000D03*\n",
        "G36*\n",
        "X300000Y0D02*\n",
        "X400000Y0D01*\n",
        "X400000Y100000D01*\n",
        "X300000Y100000D01*\n",
        "X300000Y0D01*\n",
        "G37*"
    ));
    let file = parse(&text).unwrap();

    // when
    let output = ScaleTransformer::new(1.1, 1.1)
        .with_scaled_catalog(true)
        .apply(&file);

    // then
    let kinds: Vec<_> = output
        .original
        .iter()
        .map(|geometry| geometry.kind())
        .collect();
    assert_eq!(kinds, vec![
        GeometryKind::Arc,
        GeometryKind::Draw,
        GeometryKind::FlashAperture,
        GeometryKind::FlashAperture,
        GeometryKind::FlashAperture,
        GeometryKind::Region,
    ]);

    // the arc is a quarter circle of radius 1 around the origin
    for point in output.original[0].points() {
        assert_near(length(point.coords), 1.0);
    }

    // the donut is one added and one cut-out circle
    assert_eq!(output.original[3].exposure(), Exposure::Add);
    assert_eq!(output.original[4].exposure(), Exposure::CutOut);

    // square corners move diagonally, 0.1 along their normal
    let region = output.transformed[5].bounding_box();
    assert_near(region.width(), 10.0 + 0.2 / 2f64.sqrt());
    assert_near(region.height(), 10.0 + 0.2 / 2f64.sqrt());

    // the obround pad grows, staying centered
    let original = output.original[2].bounding_box();
    let grown = output.transformed[2].bounding_box();
    assert!(grown.width() > original.width());
    assert!(grown.height() > original.height());
    assert_position_near(grown.center(), original.center());

    assert_eq!(
        output
            .scaled_catalog
            .unwrap()
            .len(),
        3
    );
}

#[test]
fn identity_scale_preserves_every_point() {
    // given
    init_logging();
    let text = gerber_program("%ADD10R,1.0X0.5*%\nD10*\nX0Y0D03*\nX10000Y0D01*");
    let file = parse(&text).unwrap();

    // when
    let output = ScaleTransformer::new(1.0, 1.0).apply(&file);

    // then
    assert_eq!(output.original, output.transformed);
}

#[test]
fn incremental_coordinates_are_fatal() {
    // given
    init_logging();
    let text = "G04 incremental*\n%FSLIX24Y24*%\n%MOMM*%\nM02*\n";

    // when
    let error = parse(text).unwrap_err();

    // then
    assert_eq!(error.line, 2);
    assert_eq!(error.cause, FormatError::UnsupportedCoordinateMode('I'));
}

#[test]
fn unknown_apertures_are_reported_and_skipped() {
    // given
    init_logging();
    let text = gerber_program("%ADD10C,1.0*%\nD10*\nD99*\nX0Y0D03*");

    // when
    let file = parse(&text).unwrap();

    // then
    assert_eq!(file.warnings.len(), 1);
    assert_eq!(file.warnings[0].kind, ParseWarningKind::UnknownAperture(99));
    // the previous aperture stays selected
    assert_eq!(file.commands.len(), 1);
    assert_eq!(file.commands[0].aperture().unwrap().code, 10);
}
