use std::fmt;

use glam::DVec2;

use super::Expression;

/// A 2D cubic bezier evaluated at parameter `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicBezierFunction {
    p0: DVec2,
    p1: DVec2,
    p2: DVec2,
    p3: DVec2,
    t: Expression,
}

impl CubicBezierFunction {
    pub fn new(p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2, t: Expression) -> Self {
        Self { p0, p1, p2, p3, t }
    }

    /// True if all four control points lie on one line, or the curve starts
    /// and ends at the same point. Such a curve can be replaced by a linear
    /// interpolation from `p0` to `p3`.
    pub fn is_colinear(&self) -> bool {
        let (p0, p1, p2, p3) = (self.p0, self.p1, self.p2, self.p3);
        if p0 == p3 {
            return true;
        }

        let d01 = p0 - p1;
        let d02 = p0 - p2;
        let d03 = p0 - p3;

        if d01.y == 0.0 || d02.y == 0.0 || d03.y == 0.0 {
            if d01.x == 0.0 || d02.x == 0.0 || d03.x == 0.0 {
                // Neither slope is defined for every pair.
                return p0 == p1 && p0 == p2 && p0 == p3;
            }
            let slope = d01.y / d01.x;
            slope == d02.y / d02.x && slope == d03.y / d03.x
        } else {
            let slope = d01.x / d01.y;
            slope == d02.x / d02.y && slope == d03.x / d03.y
        }
    }

    /// `(1-t)³p0 + 3(1-t)²t·p1 + 3(1-t)t²·p2 + t³p3`, simplified.
    pub fn to_expression(&self) -> Expression {
        let point = |p: DVec2| Expression::vector2(p.x, p.y);
        let one_minus_t = Expression::subtract(Expression::number(1.0), self.t.clone());

        let p0_part = Expression::multiply(Expression::cubed(one_minus_t.clone()), point(self.p0));
        let p1_part = Expression::multiply_all([
            Expression::number(3.0),
            Expression::squared(one_minus_t.clone()),
            self.t.clone(),
            point(self.p1),
        ]);
        let p2_part = Expression::multiply_all([
            Expression::number(3.0),
            one_minus_t,
            Expression::squared(self.t.clone()),
            point(self.p2),
        ]);
        let p3_part = Expression::multiply(Expression::cubed(self.t.clone()), point(self.p3));

        Expression::sum_all([p0_part, p1_part, p2_part, p3_part]).simplified()
    }
}

impl From<CubicBezierFunction> for Expression {
    fn from(function: CubicBezierFunction) -> Self {
        function.to_expression()
    }
}

impl fmt::Display for CubicBezierFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_expression())
    }
}
