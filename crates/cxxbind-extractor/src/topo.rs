use std::collections::HashMap;

use cxxbind_meta::{ClassArena, ClassId, FatalBuildError, TypeUsagePattern};
use smol_str::SmolStr;

/// A parent-before-child ordering constraint. Built from the class
/// graph and thrown away after sorting; not part of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub parent: ClassId,
    pub child: ClassId,
}

/// Order classes so bases precede derived classes, enclosing classes
/// precede inner ones, and a value type precedes any class embedding
/// it by value.
///
/// Diamond inheritance revisits a node; the visit marking deduplicates
/// that. A genuine cycle (possible through rule-induced edges, not
/// through legal C++) is a fatal configuration error carrying the
/// cycle path.
pub fn topological_sort(
    arena: &ClassArena,
    classes: &[ClassId],
    extra: &[Dependency],
) -> Result<Vec<ClassId>, FatalBuildError> {
    let mut edges: HashMap<ClassId, Vec<ClassId>> = HashMap::new();
    let in_set: std::collections::HashSet<ClassId> = classes.iter().copied().collect();
    let mut add_edge = |edges: &mut HashMap<ClassId, Vec<ClassId>>, parent: ClassId, child: ClassId| {
        if parent != child && in_set.contains(&parent) && in_set.contains(&child) {
            edges.entry(child).or_default().push(parent);
        }
    };

    for &id in classes {
        let class = arena.get(id);
        for &base in &class.base_classes {
            add_edge(&mut edges, base, id);
        }
        if let Some(parent) = class.enclosing_class {
            add_edge(&mut edges, parent, id);
        }
        // A field held by value embeds the type; the embedded class
        // must already exist downstream.
        for field in &class.fields {
            if field.ty.indirections().is_empty()
                && matches!(
                    field.ty.usage_pattern(),
                    TypeUsagePattern::Value | TypeUsagePattern::Container
                )
            {
                if let Some(dep) = arena.find_by_entry(field.ty.entry()) {
                    add_edge(&mut edges, dep, id);
                }
            }
        }
    }
    for dep in extra {
        add_edge(&mut edges, dep.parent, dep.child);
    }

    // Iterative DFS with white/grey/black coloring; grey hit = cycle.
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Grey,
        Black,
    }
    let mut color: HashMap<ClassId, Color> =
        classes.iter().map(|&id| (id, Color::White)).collect();
    let mut order = Vec::with_capacity(classes.len());

    fn visit(
        id: ClassId,
        edges: &HashMap<ClassId, Vec<ClassId>>,
        color: &mut HashMap<ClassId, Color>,
        order: &mut Vec<ClassId>,
        arena: &ClassArena,
        path: &mut Vec<ClassId>,
    ) -> Result<(), FatalBuildError> {
        match color[&id] {
            Color::Black => return Ok(()),
            Color::Grey => {
                let start = path.iter().position(|&p| p == id).unwrap_or(0);
                let cycle: Vec<SmolStr> = path[start..]
                    .iter()
                    .chain(std::iter::once(&id))
                    .map(|&p| arena.get(p).qualified_name.clone())
                    .collect();
                return Err(FatalBuildError::DependencyCycle { cycle });
            }
            Color::White => {}
        }
        color.insert(id, Color::Grey);
        path.push(id);
        if let Some(parents) = edges.get(&id) {
            for &parent in parents {
                visit(parent, edges, color, order, arena, path)?;
            }
        }
        path.pop();
        color.insert(id, Color::Black);
        order.push(id);
        Ok(())
    }

    let mut path = Vec::new();
    for &id in classes {
        visit(id, &edges, &mut color, &mut order, arena, &mut path)?;
    }
    Ok(order)
}
