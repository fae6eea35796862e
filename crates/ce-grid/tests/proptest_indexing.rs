//! Property-based tests for grid indexing.
//!
//! Run with: cargo test -p ce-grid -- proptest

use ce_grid::{GridMesh, Point};
use proptest::prelude::*;

/// Generate a small grid together with a linear index inside it.
fn arb_mesh_and_index() -> impl Strategy<Value = (GridMesh, usize)> {
    (1usize..12, 1usize..12, 1usize..12).prop_flat_map(|(m, n, o)| {
        let Ok(mesh) = GridMesh::new(m, n, o) else {
            unreachable!("extents are positive and small");
        };
        (Just(mesh), 0..mesh.len())
    })
}

/// Generate a grid with an arbitrary (possibly invalid) point.
fn arb_mesh_and_point() -> impl Strategy<Value = (GridMesh, Point)> {
    (1usize..8, 1usize..8, 1usize..8, -3i32..10, -3i32..10, -3i32..10).prop_map(
        |(m, n, o, x, y, z)| {
            let Ok(mesh) = GridMesh::new(m, n, o) else {
                unreachable!("extents are positive and small");
            };
            (mesh, Point::new(x, y, z))
        },
    )
}

proptest! {
    #[test]
    fn proptest_ind2sub_then_sub2ind((mesh, index) in arb_mesh_and_index()) {
        let p = mesh.ind2sub(index);
        prop_assert!(p.is_some());
        prop_assert_eq!(p.and_then(|p| mesh.sub2ind(p)), Some(index));
    }

    #[test]
    fn proptest_sub2ind_then_ind2sub((mesh, p) in arb_mesh_and_point()) {
        match mesh.sub2ind(p) {
            Some(index) => {
                prop_assert!(mesh.is_valid(p));
                prop_assert!(index < mesh.len());
                prop_assert_eq!(mesh.ind2sub(index), Some(p));
            }
            None => prop_assert!(!mesh.is_valid(p)),
        }
    }

    #[test]
    fn proptest_index_is_column_major((mesh, p) in arb_mesh_and_point()) {
        let (m, n, _) = mesh.dims();
        if let Some(index) = mesh.sub2ind(p) {
            let [x, y, z] = p.as_array().map(|c| usize::try_from(c).unwrap_or(usize::MAX));
            prop_assert_eq!(index, x + y * m + z * m * n);
        }
    }
}
