use crate::shape::Shape;

/// An intersection.
///
/// Parameter `t` is the offset along the ray (in units of its direction), and
/// `what` is the shape which was hit.
#[derive(Copy, Clone, Debug)]
pub struct Intersection<'a> {
    pub t: f64,
    pub what: &'a Shape,
}

/// Two intersections are equal if their offsets match and they refer to the
/// same shape (by pointer, not by value).
impl<'a> PartialEq for Intersection<'a> {
    fn eq(&self, other: &Intersection<'a>) -> bool {
        self.t == other.t && std::ptr::eq(self.what, other.what)
    }
}

impl<'a> Intersection<'a> {
    pub fn new(t: f64, what: &'a Shape) -> Intersection<'a> {
        Intersection { t, what }
    }
}

/// A collection of intersections.
#[derive(Clone, Debug, Default)]
pub struct Intersections<'a> {
    pub intersections: Vec<Intersection<'a>>,
}

impl<'a> From<Vec<Intersection<'a>>> for Intersections<'a> {
    fn from(intersections: Vec<Intersection<'a>>) -> Intersections<'a> {
        Intersections { intersections }
    }
}

impl<'a> Intersections<'a> {
    pub fn new() -> Intersections<'a> {
        Intersections { intersections: Vec::new() }
    }

    /// The closest finite intersection with `t > t_min`, if any.
    ///
    /// Non-finite offsets are dropped and the list is sorted as a side
    /// effect.
    pub fn hit(&mut self, t_min: f64) -> Option<Intersection<'a>> {
        self.intersections.retain(|i| i.t.is_finite());
        self.sort();

        self.intersections.iter().find(|i| i.t > t_min).copied()
    }

    /// Sorts the intersections by `t`, ignoring `f64` semantics.
    pub fn sort(&mut self) {
        self.intersections.sort_by(|a, b|
            a.t.partial_cmp(&b.t).unwrap_or(std::cmp::Ordering::Equal)
        );
    }
}

#[test]
fn hit_with_some_negative() {
    let s = Shape::sphere();
    let i1 = Intersection::new(-1.0, &s);
    let i2 = Intersection::new(1.0, &s);
    let mut is = Intersections::from(vec![i1, i2]);

    assert_eq!(is.hit(0.0), Some(i2));
}

#[test]
fn hit_with_all_negative() {
    let s = Shape::sphere();
    let mut is = Intersections::from(vec![
        Intersection::new(-2.0, &s),
        Intersection::new(-1.0, &s),
    ]);

    assert_eq!(is.hit(0.0), None);
}

#[test]
fn hit_multiple() {
    let s = Shape::sphere();
    let i4 = Intersection::new(2.0, &s);
    let mut is = Intersections::from(vec![
        Intersection::new(5.0, &s),
        Intersection::new(7.0, &s),
        Intersection::new(-3.0, &s),
        i4,
    ]);

    assert_eq!(is.hit(0.0), Some(i4));
}

#[test]
fn hit_respects_minimum_offset() {
    let s = Shape::sphere();
    let far = Intersection::new(0.5, &s);
    let mut is = Intersections::from(vec![
        Intersection::new(1.0e-9, &s),
        far,
        Intersection::new(std::f64::NAN, &s),
    ]);

    assert_eq!(is.hit(1.0e-7), Some(far));
}
